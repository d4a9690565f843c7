//! Shop - ショップの商品カタログ
//!
//! 商品は固定の 4 種類。価格と効果はコードに直接書かれている。
//!
//! | id | 価格 | 効果 |
//! |----|------|------|
//! | `health_potion` | 50 | 体力 +30 |
//! | `super_food` | 80 | 体力 +20、経験値 +10 |
//! | `toy` | 30 | 気分を happy に |
//! | `collar` | 100 | レベル +1 |

use serde::Serialize;

use super::companion::Mood;

/// Effect は商品がコンパニオンに与える効果（どの組み合わせも可）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Effect {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<u32>,
    /// 経験値から決まるレベルに上乗せする固定値
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
}

/// ShopItem はカタログの 1 行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShopItem {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub price: u32,
    pub effect: Effect,
}

const EMPTY: Effect = Effect {
    health: None,
    experience: None,
    level: None,
    mood: None,
};

static ITEMS: [ShopItem; 4] = [
    ShopItem {
        id: "health_potion",
        name: "Health Potion",
        description: "Restore pet health +30",
        icon: "💊",
        price: 50,
        effect: Effect {
            health: Some(30),
            ..EMPTY
        },
    },
    ShopItem {
        id: "super_food",
        name: "Super Food",
        description: "Restore health +20, gain experience +10",
        icon: "🍖",
        price: 80,
        effect: Effect {
            health: Some(20),
            experience: Some(10),
            ..EMPTY
        },
    },
    ShopItem {
        id: "toy",
        name: "Toy",
        description: "Improve pet mood",
        icon: "🎾",
        price: 30,
        effect: Effect {
            mood: Some(Mood::Happy),
            ..EMPTY
        },
    },
    ShopItem {
        id: "collar",
        name: "Collar",
        description: "Increase pet level +1",
        icon: "🔗",
        price: 100,
        effect: Effect {
            level: Some(1),
            ..EMPTY
        },
    },
];

/// ShopCatalog は静的カタログの読み取り専用ビュー
#[derive(Debug, Clone, Copy, Default)]
pub struct ShopCatalog;

impl ShopCatalog {
    pub fn items(&self) -> &'static [ShopItem] {
        &ITEMS
    }

    pub fn find(&self, id: &str) -> Option<&'static ShopItem> {
        ITEMS.iter().find(|item| item.id == id)
    }

    /// `currency` で買える商品（カタログ順）
    pub fn affordable(&self, currency: u32) -> impl Iterator<Item = &'static ShopItem> {
        ITEMS
            .iter()
            .filter(move |item| can_afford(item.price, currency))
    }
}

/// 所持コインで買えるか（`currency >= price`）
pub fn can_afford(price: u32, currency: u32) -> bool {
    currency >= price
}
