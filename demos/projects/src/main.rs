use anyhow::Result;
use projects::*;

fn main() -> Result<()> {
    let settings = Settings::new("config/settings")?;
    settings.init_logging();
    let catalog = Catalog::open(&settings)?;

    for id in 1..=3 {
        catalog.insert(&User::sample(id))?;
        catalog.insert(&Project::sample(id, id))?;
    }

    let mut projects = catalog.all::<Project>()?;
    info!("Loaded {} projects without passive columns:", projects.len());
    for project in &projects {
        println!("{}", serde_json::to_string_pretty(&project.to_json())?);
    }

    let first = &mut projects[0];
    let description: Option<String> = first.read_as("description")?;
    info!("Lazily loaded description: {:?}", description);

    let validations = project_validations(&catalog.registry)?;
    first.write("settings", "not json")?;
    match catalog.save(first, &validations) {
        Err(PassiveError::Invalid(errors)) => info!("Rejected update: {}", errors),
        other => other?,
    }
    first.write("settings", r#"{"visibility":"public"}"#)?;
    catalog.save(first, &validations)?;

    let mut archived = catalog.find::<ArchivedProject>(1)?;
    info!("Archived view of project 1 is passive on {:?}", archived.declaration().passive_attributes());
    info!("Settings after save: {}", archived.read("settings")?);
    Ok(())
}
