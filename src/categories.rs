//! Static category lookup keyed by URL slug.
//!
//! Navigation carries category and subcategory slugs (`trader/mining-loot`);
//! the store and the table show display names (`Trader` / `Mining Loot`).
//! This module owns that mapping and the menu section each category
//! highlights.

use crate::error::{MarketError, Result};

/// One top-level category and its optional subcategories.
#[derive(Debug, Clone, Copy)]
pub struct CategoryEntry {
    pub slug: &'static str,
    pub name: &'static str,
    pub subcategories: &'static [(&'static str, &'static str)],
}

impl CategoryEntry {
    /// Display name for a subcategory slug of this category.
    pub fn subcategory(&self, slug: &str) -> Option<&'static str> {
        self.subcategories
            .iter()
            .find(|(s, _)| *s == slug)
            .map(|(_, name)| *name)
    }
}

pub const CATEGORIES: &[CategoryEntry] = &[
    CategoryEntry {
        slug: "enhancement-materials",
        name: "Enhancement Material",
        subcategories: &[
            ("honing-materials", "Honing Materials"),
            ("additional-honing-materials", "Additional Honing Materials"),
            ("other-materials", "Other Materials"),
        ],
    },
    CategoryEntry {
        slug: "trader",
        name: "Trader",
        subcategories: &[
            ("foraging-rewards", "Foraging Rewards"),
            ("loggin-loot", "Logging Loot"),
            ("mining-loot", "Mining Loot"),
            ("hunting-loot", "Hunting Loot"),
            ("fishing-loot", "Fishing Loot"),
            ("excavating-loot", "Excavating Loot"),
            ("other", "Other"),
        ],
    },
    CategoryEntry {
        slug: "engraving-recipe",
        name: "Engraving Recipe",
        subcategories: &[],
    },
    CategoryEntry {
        slug: "combat-supplies",
        name: "Combat Supplies",
        subcategories: &[
            ("recovery", "Battle Item - Recovery"),
            ("offense", "Battle Item - Offense"),
            ("utility", "Battle Item - Utility"),
            ("buff", "Battle Item - Buff"),
        ],
    },
    CategoryEntry {
        slug: "adventurers-tome",
        name: "Adventurer's Tome",
        subcategories: &[],
    },
];

/// Display names resolved from a category slug pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCategory {
    pub category: String,
    pub subcategory: Option<String>,
}

/// Look up a category entry by slug.
pub fn find(slug: &str) -> Option<&'static CategoryEntry> {
    CATEGORIES.iter().find(|c| c.slug == slug)
}

/// Resolve a category slug and optional subcategory slug to display names.
///
/// Fails with [`MarketError::UnknownCategory`] when the category slug is not
/// in the table, or when a subcategory slug is given that the category does
/// not list.
pub fn resolve(category: &str, subcategory: Option<&str>) -> Result<ResolvedCategory> {
    let unknown = || MarketError::UnknownCategory {
        category: category.to_string(),
        subcategory: subcategory.map(str::to_string),
    };
    let entry = find(category).ok_or_else(unknown)?;
    let subcategory = match subcategory {
        Some(sub) => Some(entry.subcategory(sub).ok_or_else(unknown)?.to_string()),
        None => None,
    };
    Ok(ResolvedCategory {
        category: entry.name.to_string(),
        subcategory,
    })
}

/// The navigation menu section expanded for the current category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuSection {
    EnhancementMaterials,
    Trader,
    EngravingRecipe,
    CombatSupplies,
    AdventurersTome,
}

impl MenuSection {
    /// Derive the highlighted section from a category display name.
    pub fn for_category(category: Option<&str>) -> Option<MenuSection> {
        match category? {
            "Enhancement Material" => Some(MenuSection::EnhancementMaterials),
            "Trader" => Some(MenuSection::Trader),
            "Engraving Recipe" => Some(MenuSection::EngravingRecipe),
            "Combat Supplies" => Some(MenuSection::CombatSupplies),
            "Adventurer's Tome" => Some(MenuSection::AdventurersTome),
            _ => None,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            MenuSection::EnhancementMaterials => "enhancement-materials",
            MenuSection::Trader => "trader",
            MenuSection::EngravingRecipe => "engraving-recipe",
            MenuSection::CombatSupplies => "combat-supplies",
            MenuSection::AdventurersTome => "adventurers-tome",
        }
    }
}
