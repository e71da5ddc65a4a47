use anyhow::Result;
use shelf_core::CollectionRegistry;

pub fn list(registry: &CollectionRegistry) -> Result<()> {
    let ids = registry.list()?;
    if ids.is_empty() {
        println!(
            "No collections under {}. Use `shelf collections create <name>`.",
            registry.root().display()
        );
        return Ok(());
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}

pub fn create(registry: &CollectionRegistry, id: &str) -> Result<()> {
    let collection = registry.create(id)?;
    println!("Created collection {} at {}", id, collection.path().display());
    collection.close()?;
    Ok(())
}

pub fn delete(registry: &CollectionRegistry, id: &str) -> Result<()> {
    registry.delete(id)?;
    println!("Deleted collection {id}");
    Ok(())
}

pub fn clear(registry: &CollectionRegistry) -> Result<()> {
    let count = registry.list()?.len();
    registry.clear()?;
    println!("Deleted {count} collection(s)");
    Ok(())
}
