pub mod fostering;
