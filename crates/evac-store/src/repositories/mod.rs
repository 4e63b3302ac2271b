pub mod floors;
pub mod images;
pub mod routes;
pub mod settings;

pub use floors::FloorRepository;
pub use images::ImageRepository;
pub use routes::RouteRepository;
pub use settings::SettingsRepository;
