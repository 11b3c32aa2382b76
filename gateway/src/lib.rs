// Fleetlink upload gateway - HTTP surface for camera uploads

pub mod handlers;
pub mod handshake;
pub mod imei;
pub mod state;
