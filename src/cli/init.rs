
use crate::db::{get_connection, init_db, DB_FILE};
use crate::error::Result;
use crate::settings::{expand_home, get_data_dir, load_settings, save_settings};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = expand_home(&dir);
    }
    save_settings(&settings)?;

    let resolved = get_data_dir();
    std::fs::create_dir_all(&resolved)?;
    std::fs::create_dir_all(resolved.join("exports"))?;

    let conn = get_connection(&resolved.join(DB_FILE))?;
    init_db(&conn)?;

    println!("Initialized bankrecon at {}", resolved.display());
    Ok(())
}
