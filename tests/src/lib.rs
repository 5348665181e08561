//! # Equipment Lending Test Suite
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── workflow_benchmarks.rs   # ledger throughput under contention
//! └── src/integration/
//!     ├── fixtures.rs              # World: runtime + recording sink
//!     ├── flows.rs                 # end-to-end order lifecycles
//!     ├── concurrency.rs           # races on a single order
//!     └── notifications.rs         # post-commit fan-out
//! ```
//!
//! ```bash
//! cargo test -p el-tests
//! cargo bench -p el-tests
//! ```

pub mod integration;
