pub mod pointsdtos;
