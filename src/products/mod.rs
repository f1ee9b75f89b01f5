mod csv;
mod view;

pub use csv::{ImportReport, RowError, import_csv};
pub use view::{ProductGroup, VariantView, build_product_view, title_from_handle};
