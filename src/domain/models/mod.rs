pub mod body;
pub mod config;
pub mod priority;
pub mod squad;
pub mod task;
pub mod unit;
pub mod world;
pub mod zone;
pub mod zone_migration;

pub use body::{base_body, body_cost, max_body, BodyPart};
pub use config::{
    Config, EngineConfig, LogFormat, LoggingConfig, RotationPolicy, ScheduleConfig, StoreBackend,
    StoreConfig,
};
pub use priority::{
    clamp_score, ExpansionKind, PriorityRecord, PrioritySet, ProductionPriorities, MAX_SCORE,
    MIN_SCORE,
};
pub use squad::{SquadMember, SquadSpecification};
pub use task::{Role, TaskCatalog, TaskCategory, TaskDefinition, TaskKind};
pub use unit::{TaskBinding, Unit, UnitCensus, UnitType, WorkingState};
pub use world::{
    BarrierView, ConstructionSite, ControllerView, ExpansionTarget, HostileView, MineralDensity,
    MineralView, Position, SpawnView, StoreView, StructureKind, TargetZoneView, ZoneId,
    ZoneSnapshot, ZoneView,
};
pub use zone::{BlockageEntry, PinnedRoles, ZoneState, ZONE_STATE_VERSION};
pub use zone_migration::migrate_zone_state;
