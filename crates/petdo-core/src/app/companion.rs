//! CompanionEngine - コンパニオンのレコードを所有する
//!
//! # フロー
//! 1. `init()`: KeyValueStore から読み込み（無い・壊れている場合はデフォルト）
//! 2. reward / penalty / purchase: 純粋関数で次の状態を計算
//! 3. 状態を差し替えて `persist()`（全体を上書き）
//! 4. EventSink に通知（fire-and-forget）

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::{Companion, CompanionEvent, PurchaseError, ShopItem, Species, StoreError};
use crate::domain::companion::{PENALTY_HEALTH, REWARD_COINS, REWARD_EXPERIENCE};
use crate::ports::{EventSink, KeyValueStore, COMPANION_KEY};

/// What a brand-new companion looks like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionDefaults {
    pub name: String,
    pub species: Species,
}

impl Default for CompanionDefaults {
    fn default() -> Self {
        Self {
            name: "Helper".to_string(),
            species: Species::Cat,
        }
    }
}

pub struct CompanionEngine {
    companion: Companion,
    store: Arc<dyn KeyValueStore>,
    sink: Arc<dyn EventSink>,
}

impl CompanionEngine {
    /// Load the persisted companion or fall back to a fresh one.
    ///
    /// Never fails: a missing record, an unreadable store or a record that
    /// does not parse all yield the default companion (logged).
    pub fn init(
        store: Arc<dyn KeyValueStore>,
        sink: Arc<dyn EventSink>,
        defaults: &CompanionDefaults,
    ) -> Self {
        let companion = match store.get(COMPANION_KEY) {
            Ok(Some(value)) => match serde_json::from_value::<Companion>(value) {
                Ok(loaded) => {
                    let companion = loaded.repaired();
                    if companion != loaded {
                        tracing::warn!(
                            health = loaded.health,
                            level = loaded.level,
                            "companion record out of range; repaired"
                        );
                    }
                    tracing::debug!(name = %companion.name, level = companion.level, "companion loaded");
                    companion
                }
                Err(err) => {
                    tracing::warn!(error = %err, "companion record is corrupt; using defaults");
                    Companion::new(defaults.name.clone(), defaults.species)
                }
            },
            Ok(None) => {
                tracing::info!(name = %defaults.name, "no companion record; creating a new one");
                Companion::new(defaults.name.clone(), defaults.species)
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to read companion record; using defaults");
                Companion::new(defaults.name.clone(), defaults.species)
            }
        };

        let engine = Self {
            companion,
            store,
            sink,
        };
        engine.persist_or_warn();
        engine
    }

    pub fn companion(&self) -> &Companion {
        &self.companion
    }

    pub fn apply_reward(&mut self) -> &Companion {
        self.replace(self.companion.rewarded());
        self.sink.emit(CompanionEvent::RewardGranted {
            coins: REWARD_COINS,
            experience: REWARD_EXPERIENCE,
        });
        &self.companion
    }

    pub fn apply_penalty(&mut self) -> &Companion {
        self.replace(self.companion.penalized());
        self.sink.emit(CompanionEvent::PenaltyApplied {
            health_delta: -(PENALTY_HEALTH as i32),
        });
        &self.companion
    }

    /// Buy `item`. Rejected purchases leave the companion untouched.
    pub fn purchase(&mut self, item: &'static ShopItem) -> Result<&Companion, PurchaseError> {
        let next = self
            .companion
            .purchased(item.price, &item.effect)
            .ok_or(PurchaseError::InsufficientFunds {
                price: item.price,
                balance: self.companion.currency,
            })?;
        self.replace(next);
        self.sink.emit(CompanionEvent::PurchaseMade { item: item.id });
        Ok(&self.companion)
    }

    /// Overwrite the durable record with the current state.
    pub fn persist(&self) -> Result<(), StoreError> {
        let value = serde_json::to_value(&self.companion)?;
        self.store.put(COMPANION_KEY, &value)
    }

    fn replace(&mut self, next: Companion) {
        self.companion = next;
        self.persist_or_warn();
    }

    fn persist_or_warn(&self) {
        if let Err(err) = self.persist() {
            tracing::warn!(error = %err, "failed to persist companion");
        }
    }
}
