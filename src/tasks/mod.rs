mod delivery_worker;

pub use delivery_worker::DeliveryWorker;
