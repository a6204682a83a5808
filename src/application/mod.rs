pub mod converter;
pub mod numbering_service;
pub mod order_service;
pub mod purchase_list_service;
pub mod retry;
pub mod transfer_service;
