//! Companion - コンパニオンと報酬・ペナルティの計算
//!
//! ## 数値
//! - 完了: コイン +10、経験値 +5
//! - 期限切れ: 体力 -15（0 で下げ止まり）
//! - レベル: `floor(経験値 / 100) + 1`
//!
//! ここは純粋関数だけ。どの操作も次の Companion を返し、
//! 永続化と通知は `app::companion` に任せる。

use serde::{Deserialize, Serialize};
use std::fmt;

use super::shop::Effect;

pub const MAX_HEALTH: u32 = 100;
pub const EXPERIENCE_PER_LEVEL: u32 = 100;

pub const REWARD_COINS: u32 = 10;
pub const REWARD_EXPERIENCE: u32 = 5;
pub const PENALTY_HEALTH: u32 = 15;

/// 種族（表示用のみ、数値には影響しない）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Cat,
    Dog,
    Rabbit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Happy,
    Sad,
    Excited,
    Tired,
}

/// 直近の報酬・ペナルティに合わせた見た目のタグ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Appearance {
    #[default]
    Normal,
    Excited,
    Hurt,
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Species::Cat => "cat",
            Species::Dog => "dog",
            Species::Rabbit => "rabbit",
        })
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Excited => "excited",
            Mood::Tired => "tired",
        })
    }
}

/// 経験値から求めるレベル: `floor(experience / 100) + 1`
pub fn level_for(experience: u32) -> u32 {
    experience / EXPERIENCE_PER_LEVEL + 1
}

/// Companion は永続化されるコンパニオンのレコード
///
/// # 不変条件
/// - `health` は 0..=100
/// - `level` は 1 以上（購入で `level_for(experience)` を上回ることはある）
///
/// フィールド名がそのままディスク上の形式になる。変えないこと。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Companion {
    pub name: String,
    pub species: Species,
    pub level: u32,
    pub experience: u32,
    pub health: u32,
    pub currency: u32,
    pub mood: Mood,
    #[serde(default)]
    pub appearance: Appearance,
}

impl Companion {
    /// レベル 1・体力満タンの新しいコンパニオン
    pub fn new(name: impl Into<String>, species: Species) -> Self {
        Self {
            name: name.into(),
            species,
            level: 1,
            experience: 0,
            health: MAX_HEALTH,
            currency: 0,
            mood: Mood::Happy,
            appearance: Appearance::Normal,
        }
    }

    /// タスク完了: コイン +10、経験値 +5、happy / excited になる
    pub fn rewarded(&self) -> Self {
        let experience = self.experience.saturating_add(REWARD_EXPERIENCE);
        Self {
            currency: self.currency.saturating_add(REWARD_COINS),
            experience,
            level: level_for(experience),
            mood: Mood::Happy,
            appearance: Appearance::Excited,
            ..self.clone()
        }
    }

    /// 期限切れ: 体力 -15（0 で下げ止まり）、sad / hurt になる
    pub fn penalized(&self) -> Self {
        Self {
            health: self.health.saturating_sub(PENALTY_HEALTH),
            mood: Mood::Sad,
            appearance: Appearance::Hurt,
            ..self.clone()
        }
    }

    pub fn can_afford(&self, price: u32) -> bool {
        super::shop::can_afford(price, self.currency)
    }

    /// `price` を払って `effect` を適用する。足りなければ `None`
    ///
    /// # 適用順
    /// 1. 体力の増減（0..=100 に収める）
    /// 2. 経験値の加算とレベル再計算
    /// 3. レベルの固定加算（`level_for(experience)` を上回りうる）
    /// 4. 気分の上書き
    pub fn purchased(&self, price: u32, effect: &Effect) -> Option<Self> {
        if !self.can_afford(price) {
            return None;
        }
        let mut next = self.clone();
        next.currency -= price;

        if let Some(delta) = effect.health {
            let health = i64::from(next.health) + i64::from(delta);
            next.health = health.clamp(0, i64::from(MAX_HEALTH)) as u32;
        }
        if let Some(delta) = effect.experience {
            next.experience = next.experience.saturating_add(delta);
            next.level = level_for(next.experience);
        }
        if let Some(delta) = effect.level {
            next.level = next.level.saturating_add(delta);
        }
        if let Some(mood) = effect.mood {
            next.mood = mood;
        }
        Some(next)
    }

    /// 読み込んだレコードを不変条件に合わせて補正する
    ///
    /// `health` は `MAX_HEALTH` まで、`level` は最低 1 に揃える。
    /// `level` の下限は `level_for(experience)` ではなく 1 なので、
    /// 購入で上げたレベルは保たれる。
    pub fn repaired(&self) -> Self {
        Self {
            health: self.health.min(MAX_HEALTH),
            level: self.level.max(1),
            ..self.clone()
        }
    }
}

impl Default for Companion {
    fn default() -> Self {
        Self::new("Helper", Species::Cat)
    }
}
