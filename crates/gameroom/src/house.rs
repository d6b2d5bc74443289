use super::*;
use parlay_core::Credits;
use parlay_core::ID;
use parlay_core::SPIN_TICKS;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory economy ledger for local play.
/// First touch of a user seeds them with the grant; debits below zero are
/// refused, which is exactly the behavior the stake gates expect.
pub struct Vault {
    grant: Credits,
    balances: Mutex<HashMap<ID<Member>, Credits>>,
}

impl Vault {
    pub fn new(grant: Credits) -> Self {
        Self {
            grant,
            balances: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl Economy for Vault {
    async fn apply(&self, user: ID<Member>, delta: Credits) -> Result<Credits, CollabError> {
        let mut balances = self.balances.lock().expect("vault lock");
        let balance = balances.entry(user).or_insert(self.grant);
        if *balance + delta < 0 {
            return Err(CollabError(format!(
                "balance {} cannot cover {}",
                balance, delta
            )));
        }
        *balance += delta;
        Ok(*balance)
    }
    async fn balance(&self, user: ID<Member>) -> Credits {
        *self
            .balances
            .lock()
            .expect("vault lock")
            .entry(user)
            .or_insert(self.grant)
    }
    async fn effect(&self, user: ID<Member>, effect: &SideEffect) -> Result<(), CollabError> {
        log::info!("[vault] side effect {} for {}", effect.0, user);
        Ok(())
    }
}

/// Profile gate that admits everyone as Ready.
pub struct OpenGate;

#[async_trait::async_trait]
impl ProfileGate for OpenGate {
    async fn is_ready(&self, _: ID<Member>) -> bool {
        true
    }
}

/// Payout engine with a fixed delta and a canned animation.
/// Useful for wiring tests and local demos; real engines live elsewhere.
pub struct FixedWheel {
    delta: Credits,
}

impl FixedWheel {
    pub fn new(delta: Credits) -> Self {
        Self { delta }
    }
}

#[async_trait::async_trait]
impl Payout for FixedWheel {
    async fn resolve(
        &self,
        _: ID<Member>,
        _: Credits,
        _: &TurnTicket,
    ) -> Result<Resolution, CollabError> {
        Ok(Resolution {
            frames: (1..=SPIN_TICKS).map(|i| "|".repeat(i)).collect(),
            outcome: "|".repeat(SPIN_TICKS),
            delta: self.delta,
            effects: Vec::new(),
        })
    }
}
