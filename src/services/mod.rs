//! Business logic services

pub mod catalog;
pub mod circulation;
pub mod events;
pub mod users;

use crate::{
    config::{AuthConfig, CirculationConfig, UsersConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub catalog: catalog::CatalogService,
    pub circulation: circulation::CirculationService,
    pub events: events::EventsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        users_config: UsersConfig,
        circulation_config: CirculationConfig,
    ) -> Self {
        let events = events::EventsService::new();
        Self {
            users: users::UsersService::new(repository.clone(), auth_config, users_config),
            catalog: catalog::CatalogService::new(repository.clone()),
            circulation: circulation::CirculationService::new(repository, circulation_config),
            events,
        }
    }
}
