//! Filter categories and their structural position in the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category a filter belongs to.
///
/// Categories run at fixed structural positions regardless of the order in
/// which filters are declared:
///
/// ```text
/// Authorization → Resource → [Exception guard → Action → handler] → Result
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum FilterCategory {
    /// Decides whether the request may proceed at all.
    Authorization = 1,
    /// Wraps everything after authorization, including result execution.
    Resource = 2,
    /// Observes faults escaping the action stage.
    Exception = 3,
    /// Wraps handler invocation.
    Action = 4,
    /// Wraps result execution.
    Result = 5,
}

impl FilterCategory {
    /// Every category, in structural order.
    pub const ALL: [Self; 5] = [
        Self::Authorization,
        Self::Resource,
        Self::Exception,
        Self::Action,
        Self::Result,
    ];

    /// Returns the category name used in logs and metrics labels.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Authorization => "authorization",
            Self::Resource => "resource",
            Self::Exception => "exception",
            Self::Action => "action",
            Self::Result => "result",
        }
    }

    /// Returns true for categories driven by the composed-continuation engine.
    #[must_use]
    pub const fn is_chained(self) -> bool {
        matches!(self, Self::Resource | Self::Action | Self::Result)
    }
}

impl fmt::Display for FilterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_order() {
        let mut shuffled = vec![
            FilterCategory::Result,
            FilterCategory::Authorization,
            FilterCategory::Action,
            FilterCategory::Resource,
            FilterCategory::Exception,
        ];
        shuffled.sort();
        assert_eq!(shuffled, FilterCategory::ALL);
    }

    #[test]
    fn test_chained_categories() {
        assert!(FilterCategory::Resource.is_chained());
        assert!(FilterCategory::Action.is_chained());
        assert!(FilterCategory::Result.is_chained());
        assert!(!FilterCategory::Authorization.is_chained());
        assert!(!FilterCategory::Exception.is_chained());
    }

    #[test]
    fn test_display_matches_serde() {
        for category in FilterCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{category}\""));
        }
    }
}
