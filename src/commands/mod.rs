pub mod index;
pub mod terms;
