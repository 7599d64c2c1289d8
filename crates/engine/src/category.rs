use std::fmt;

/// Meal category attached to an expense.
///
/// The bot offers a fixed menu ([`Category::CHOICES`]) but rows written by
/// other tools may carry any label, so the type is free text.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Category(String);

impl Category {
    /// Labels offered by the category menu, in display order.
    pub const CHOICES: [&'static str; 4] = ["Breakfast", "Lunch", "Dinner", "Other"];

    /// Used when an amount arrives before any category was picked.
    pub const FALLBACK: &'static str = "Other";

    /// Builds a category from a label. Blank labels become the fallback.
    pub fn new(label: impl AsRef<str>) -> Self {
        let label = label.as_ref().trim();
        if label.is_empty() {
            return Self::fallback();
        }
        Self(label.to_string())
    }

    pub fn fallback() -> Self {
        Self(Self::FALLBACK.to_string())
    }

    /// The menu as categories.
    pub fn choices() -> Vec<Category> {
        Self::CHOICES.iter().map(Category::new).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::fallback()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_label_falls_back() {
        assert_eq!(Category::new("  "), Category::fallback());
        assert_eq!(Category::default().as_str(), "Other");
    }

    #[test]
    fn label_is_trimmed_not_normalized() {
        assert_eq!(Category::new(" Lunch ").as_str(), "Lunch");
        assert_eq!(Category::new("late snack").as_str(), "late snack");
    }

    #[test]
    fn menu_contains_fallback() {
        assert!(Category::choices().contains(&Category::fallback()));
    }
}
