pub mod pagination;
pub mod response;

pub use pagination::{PageWindow, PaginatedResponse, PaginationInfo, PaginationQuery};
pub use response::ApiResponse;
