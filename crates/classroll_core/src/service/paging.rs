//! Page/page-size normalization for roster listings.

use serde::{Deserialize, Serialize};

pub const ROSTER_DEFAULT_PAGE_SIZE: u32 = 20;
pub const ROSTER_MAX_PAGE_SIZE: u32 = 100;
pub const AUDIT_DEFAULT_PAGE_SIZE: u32 = 50;

/// Bounds for audit trail listings.
pub const AUDIT_PAGE_LIMITS: PageLimits = PageLimits {
    default_page_size: AUDIT_DEFAULT_PAGE_SIZE,
    max_page_size: ROSTER_MAX_PAGE_SIZE,
};

/// Page-size bounds applied to every roster listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: ROSTER_DEFAULT_PAGE_SIZE,
            max_page_size: ROSTER_MAX_PAGE_SIZE,
        }
    }
}

/// Resolved 1-based page with its row window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub page_size: u32,
    pub offset: u32,
}

impl PageLimits {
    /// Missing or zero page means the first page; missing or zero size uses
    /// the default; sizes above the max are clamped.
    pub fn window(&self, page: Option<u32>, page_size: Option<u32>) -> PageWindow {
        let max_page_size = self.max_page_size.max(1);
        let page = page.filter(|value| *value > 0).unwrap_or(1);
        let page_size = match page_size {
            None | Some(0) => self.default_page_size.clamp(1, max_page_size),
            Some(value) => value.min(max_page_size),
        };
        PageWindow {
            page,
            page_size,
            offset: (page - 1).saturating_mul(page_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PageLimits, AUDIT_PAGE_LIMITS};

    #[test]
    fn defaults_apply_to_missing_values() {
        let window = PageLimits::default().window(None, None);
        assert_eq!(window.page, 1);
        assert_eq!(window.page_size, 20);
        assert_eq!(window.offset, 0);
    }

    #[test]
    fn zero_values_fall_back_and_size_is_clamped() {
        let limits = PageLimits::default();
        let window = limits.window(Some(0), Some(0));
        assert_eq!((window.page, window.page_size), (1, 20));

        let window = limits.window(Some(3), Some(500));
        assert_eq!(window.page_size, 100);
        assert_eq!(window.offset, 200);
    }

    #[test]
    fn offset_saturates_instead_of_overflowing() {
        let window = PageLimits::default().window(Some(u32::MAX), Some(100));
        assert_eq!(window.offset, u32::MAX);
    }

    #[test]
    fn audit_listing_defaults_to_fifty_rows() {
        let window = AUDIT_PAGE_LIMITS.window(None, None);
        assert_eq!(window.page_size, 50);
        assert_eq!(AUDIT_PAGE_LIMITS.window(Some(2), Some(500)).page_size, 100);
    }
}
