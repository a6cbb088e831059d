// All repository functions are generic over `E: Executor<'e, Database = Postgres>`
// so they accept both a `&PgPool` (direct query) and a `&mut Transaction` (atomic operations).
// Soft-deleted rows (`deleted_at IS NOT NULL`) are invisible to every read.

pub mod access_code;
pub mod category;
pub mod invitation;
pub mod maintenance;
pub mod mystery_box;
pub mod notification;
pub mod quiz;
pub mod story;
pub mod user;
pub mod word_search;
