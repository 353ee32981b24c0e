//! UI Fragments
//! 共通の親を持たない独立した UI 部品。ストアを注入され、mount 時に購読し drop で解除する。

pub mod cart_badge;
pub mod cart_sidebar;
pub mod filter_panel;
pub mod product_grid;

pub use cart_badge::CartBadge;
pub use cart_sidebar::CartSidebar;
pub use filter_panel::FilterPanel;
pub use product_grid::ProductGrid;
