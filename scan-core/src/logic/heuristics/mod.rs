//! Heuristics Module
//!
//! Chấm điểm nhanh URL bằng bảng luật tĩnh, không cần network.
//!
//! ## Structure
//! - `rules`: Điểm cộng cho từng luật và các regex
//! - `scorer`: Áp dụng luật lên URL + domain
//!
//! ## Usage
//! ```ignore
//! use antiscam_core::logic::heuristics::run_heuristics;
//!
//! let result = run_heuristics("http://vietcombank-login.xyz", "vietcombank-login.xyz");
//! assert!(result.score >= 50);
//! ```

pub mod rules;
pub mod scorer;

pub use scorer::{run_heuristics, HeuristicResult};
