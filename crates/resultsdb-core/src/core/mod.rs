// resultsdb-core/src/core/mod.rs
// ============================================================================
// Module: ResultsDB Core Types
// Description: Identifiers, enumerations, records, timestamps, and errors.
// Purpose: Group the data model shared by the runtime and transports.
// Dependencies: crate::core::*
// ============================================================================

//! ## Overview
//! Core types describe ResultsDB data independently of any transport. They
//! carry no I/O and can be constructed freely in tests.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod device;
pub mod errors;
pub mod identifiers;
pub mod levels;
pub mod naming;
pub mod query;
pub mod records;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use device::DeviceComponent;
pub use device::DeviceComponents;
pub use errors::ClientError;
pub use errors::ExperimentError;
pub use identifiers::ExperimentId;
pub use identifiers::ResultId;
pub use levels::MemberInput;
pub use levels::NamedMember;
pub use levels::ResultQuality;
pub use levels::ShareLevel;
pub use levels::member_from_wire;
pub use levels::parse_member;
pub use naming::data_file_name;
pub use naming::figure_file_name;
pub use query::AnalysisResultQuery;
pub use query::ExperimentQuery;
pub use records::AccountContext;
pub use records::AnalysisResultDraft;
pub use records::AnalysisResultRecord;
pub use records::AnalysisResultUpdate;
pub use records::DeleteOutcome;
pub use records::ExperimentDraft;
pub use records::ExperimentRecord;
pub use records::ExperimentUpdate;
pub use records::FigureReceipt;
pub use records::FileData;
pub use records::UpdateOutcome;
pub use time::DateTimeInput;
pub use time::LocalZone;
pub use time::UtcSuffix;
