pub mod clock;
pub mod errors;
pub mod events;
pub mod history;
pub mod numbering;
pub mod order;
pub mod ports;
pub mod purchase_list;
pub mod transfer;
