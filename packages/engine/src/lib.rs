//! Viva recall engine
//!
//! Schedules which stored multiple-choice items a learner reviews next and
//! refines an online recall model from every answer.
//!
//! - [`storage`]: SQLite item store and model blob storage
//! - [`model`]: the persisted recall model
//! - [`selector`]: tiered session assembly
//! - [`update_loop`]: one answer event from snapshot to item update
//! - [`analytics`]: progress summaries
//! - [`engine`]: [`RecallEngine`], which owns all of the above
//!
//! ```no_run
//! use viva_engine::{logging, Config, RecallEngine};
//!
//! let config = Config::from_env();
//! let _guard = logging::init_tracing(&config.log_level);
//! let mut engine = RecallEngine::open(&config).expect("open engine");
//!
//! let size = engine.session_size();
//! for item in engine.select_session(size, None) {
//!     let p = engine.predict_recall(&item);
//!     println!("{} ({p:.2})", item.prompt);
//!     engine.record_response(item.id, true, 4.2);
//! }
//! ```

pub mod analytics;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod selector;
pub mod storage;
pub mod update_loop;

pub use analytics::{Analytics, MasteryForecast, OverallStats, ReviewLogEntry, SubjectPerformance};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use engine::RecallEngine;
pub use error::{EngineError, EngineResult};
pub use model::{ModelError, ModelResult, RecallModel};
pub use selector::SessionSelector;
pub use storage::{
    AnswerLetter, DatabaseManager, FileBlobStore, Item, ItemError, ItemRepository, MemoryBlobStore,
    ModelBlobStore, NewItem, StorageError, StorageResult,
};
pub use update_loop::{AnswerEvent, ReviewOutcome, UpdateLoop};

pub use viva_algo::{FeatureVector, MasteryBand, ModelPhase, RecallModelConfig};
