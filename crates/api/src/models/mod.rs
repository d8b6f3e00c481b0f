//! Domain models.
//!
//! Row types decoded with `sqlx::FromRow`, plus the input structs the
//! repositories accept. HTTP payloads live in `crate::schemas`.

pub mod category;
pub mod order;
pub mod product;
pub mod user;

pub use category::{Category, CategoryChanges, CategoryWithCount, NewCategory};
pub use order::{
    DraftLine, Order, OrderAddress, OrderChanges, OrderDraft, OrderItem, OrderWithItems,
};
pub use product::{NewProduct, Product, ProductChanges, ProductFilter};
pub use user::{CompanyDetails, ProfileChanges, ShippingAddress, User, VerificationToken};
