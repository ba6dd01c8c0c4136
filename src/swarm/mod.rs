//! Service specification model.
//!
//! These are the types produced by the compiler and handed to whatever
//! submits the service to an orchestrator. They carry no behavior beyond
//! serialization and parsing of their enumerated tags.

mod types;

pub use types::{
    Annotations, ContainerSpec, Driver, DnsConfig, EndpointSpec, FailureAction, GlobalService,
    HealthConfig, Mount, MountType, NetworkAttachmentConfig, Placement, PortConfig, PortProtocol,
    PublishMode, ReplicatedService, ResolutionMode, ResourceRequirements, Resources,
    RestartCondition, RestartPolicy, SecretFile, SecretReference, ServiceMode, ServiceSpec,
    TaskSpec, UpdateConfig,
};
