pub mod audit;
pub mod db_utils;
pub mod employee_id_cache;
pub mod employee_id_filter;
pub mod id_gen;
