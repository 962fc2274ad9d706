//! Atlas Combat Core
//!
//! Headless боевое ядро на Bevy 0.16 ECS: health/poise, vulnerability tiers,
//! damage pipeline, parry/combo окна, knockback impacts, 5-slot action system.
//!
//! Слои вокруг ядра (animation, physics, input/AI, UI) общаются с ним
//! только событиями - см. `combat::events` и `actions::events`.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use std::time::Duration;

// Публичные модули
pub mod actions;
pub mod combat;
pub mod config;
pub mod logger;

// Re-export для удобства
pub use actions::{
    ActionDefinition, ActionDefinitions, ActionId, ActionKind, ActionSlot, ActionSlots, ActionState,
    ActionsPlugin,
};
pub use combat::components::*;
pub use combat::{CombatPlugin, CombatSet, StationIntegrity};
pub use config::{CombatRules, ConfigError};
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_log_level, LogLevel};

/// Fixed simulation rate
pub const SIMULATION_HZ: f64 = 60.0;

/// Главный plugin (combat + actions + общие ресурсы)
///
/// Правила и таблица действий грузятся при build: из файлов, если пути
/// заданы, иначе из встроенных `data/*.ron`. Ошибка загрузки логируется,
/// дальше работают `Default` значения.
#[derive(Debug, Clone, Default)]
pub struct AtlasCombatPlugin {
    pub rules_path: Option<PathBuf>,
    pub actions_path: Option<PathBuf>,
}

impl AtlasCombatPlugin {
    pub fn with_rules(mut self, path: impl Into<PathBuf>) -> Self {
        self.rules_path = Some(path.into());
        self
    }

    pub fn with_actions(mut self, path: impl Into<PathBuf>) -> Self {
        self.actions_path = Some(path.into());
        self
    }

    fn load_rules(&self) -> Result<CombatRules, ConfigError> {
        match &self.rules_path {
            Some(path) => config::load_combat_rules(path),
            None => CombatRules::from_ron_str(config::DEFAULT_RULES_RON),
        }
    }

    fn load_actions(&self) -> Result<ActionDefinitions, ConfigError> {
        match &self.actions_path {
            Some(path) => config::load_action_definitions(path),
            None => ActionDefinitions::from_ron_str(config::DEFAULT_ACTIONS_RON),
        }
    }
}

impl Plugin for AtlasCombatPlugin {
    fn build(&self, app: &mut App) {
        // Seed мог поставить create_headless_app - не перетираем
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        // Явно вставленные до plugin'а ресурсы имеют приоритет
        if !app.world().contains_resource::<CombatRules>() {
            match self.load_rules() {
                Ok(rules) => {
                    app.insert_resource(rules);
                }
                Err(err) => log_error(&format!("❌ Combat rules: {}, using defaults", err)),
            }
        }
        if !app.world().contains_resource::<ActionDefinitions>() {
            match self.load_actions() {
                Ok(actions) => {
                    log(&format!("Loaded {} action definitions", actions.len()));
                    app.insert_resource(actions);
                }
                Err(err) => log_error(&format!("❌ Action table: {}, using presets", err)),
            }
        }

        app
            // Fixed timestep 60Hz для combat tick
            .insert_resource(Time::<Fixed>::from_hz(SIMULATION_HZ))
            .add_plugins((CombatPlugin, ActionsPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции.
///
/// Каждый `app.update()` двигает часы ровно на один fixed step (1/60 s),
/// первый update - warm-up (delta = 0).
pub fn create_headless_app(seed: u64) -> App {
    create_headless_app_with(seed, AtlasCombatPlugin::default())
}

/// То же, но с настроенным plugin'ом (пути к RON конфигам)
pub fn create_headless_app_with(seed: u64, plugin: AtlasCombatPlugin) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / SIMULATION_HZ,
        )))
        .insert_resource(DeterministicRng::new(seed))
        .add_plugins(plugin);

    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
