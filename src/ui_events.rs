use crate::config::{AppConfig, SceneKind};
use crate::driver::Driver;
use crate::scene::build_scene;

#[derive(Debug)]
pub enum UserCommand {
    SetScene(SceneKind),
    SetConfig(Box<AppConfig>),
    Teardown,
    StateInitialized, // Notifies App that State setup is complete
}

impl Driver {
    /// Applies a command coming from the host page. `config` is the live
    /// configuration and is updated in place.
    pub fn process_command(&mut self, command: UserCommand, config: &mut AppConfig) {
        match command {
            UserCommand::SetScene(kind) => {
                if self.scene().kind() == kind {
                    log::info!("Scene {:?} already active.", kind);
                    return;
                }
                log::info!("Switching backdrop to {:?}.", kind);
                config.scene = kind;
                self.replace_scene(build_scene(config));
            }
            UserCommand::SetConfig(new_config) => {
                log::info!("Applying new config for {:?} scene.", new_config.scene);
                *config = *new_config;
                self.replace_scene(build_scene(config));
            }
            UserCommand::Teardown => self.stop(),
            UserCommand::StateInitialized => {
                // This command is handled in App::user_event
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{DriverState, SurfaceMetrics};

    fn running_driver(config: &AppConfig) -> Driver {
        let mut driver = Driver::new(build_scene(config), Some(7));
        driver.start(SurfaceMetrics { width: 640.0, height: 480.0, device_pixel_ratio: 1.0 });
        driver
    }

    #[test]
    fn set_scene_swaps_kind() {
        let mut config = AppConfig::default();
        let mut driver = running_driver(&config);
        driver.process_command(UserCommand::SetScene(SceneKind::Network), &mut config);
        assert_eq!(driver.scene().kind(), SceneKind::Network);
        assert_eq!(config.scene, SceneKind::Network);
        assert_eq!(driver.state(), DriverState::Running);
    }

    #[test]
    fn set_config_replaces_live_config() {
        let mut config = AppConfig::default();
        let mut driver = running_driver(&config);
        let mut next = AppConfig::default();
        next.mesh.node_count = 12;
        driver.process_command(UserCommand::SetConfig(Box::new(next.clone())), &mut config);
        assert_eq!(config, next);
    }

    #[test]
    fn teardown_stops_the_driver() {
        let mut config = AppConfig::default();
        let mut driver = running_driver(&config);
        driver.process_command(UserCommand::Teardown, &mut config);
        assert_eq!(driver.state(), DriverState::TornDown);
        assert!(driver.cancel_token().is_cancelled());
    }
}
