pub mod replica_controller;

pub use replica_controller::ReplicaController;
