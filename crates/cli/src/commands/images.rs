use std::path::PathBuf;

use shelf_core::{Collection, ErrorKind, ImageQuery, ImageRecord, ImageStatus, Result};

pub fn add(collection: &mut Collection, files: &[PathBuf]) -> Result<()> {
    for file in files {
        match collection.add_image(file) {
            Ok(record) => println!(
                "added   {} -> {} ({}x{})",
                file.display(),
                record.id,
                record.width,
                record.height
            ),
            Err(e) if e.kind() == ErrorKind::Duplicate => {
                println!("skipped {} ({e})", file.display())
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

pub fn list(
    collection: &Collection,
    status: Option<&str>,
    order_by: Option<&str>,
    direction: Option<&str>,
) -> Result<()> {
    let query = ImageQuery::parse(status, order_by, direction)?;
    let images = collection.images(&query)?;

    if images.is_empty() {
        println!("No images.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<10}  {:>11}  {:>9}  {}",
        "ID", "Status", "Dimensions", "KB", "Name"
    );
    println!("{}", "-".repeat(90));
    for image in &images {
        println!(
            "{:<36}  {:<10}  {:>11}  {:>9.1}  {}.{}",
            image.id,
            image.status,
            format!("{}x{}", image.width, image.height),
            image.size_bytes as f64 / 1024.0,
            image.original_name,
            image.extension(),
        );
    }
    Ok(())
}

fn print_record(collection: &Collection, record: &ImageRecord) -> Result<()> {
    println!("Image {}", record.id);
    println!("{}", "-".repeat(60));
    println!("  name:       {}.{}", record.original_name, record.extension());
    println!("  type:       {}", record.mime_type());
    println!("  size:       {} bytes", record.size_bytes);
    println!(
        "  dimensions: {}x{} (aspect {:.3})",
        record.width, record.height, record.aspect_ratio
    );
    println!("  sha256:     {}", record.content_hash);
    println!("  status:     {}", record.status);
    println!("  created:    {}", record.created_at);
    println!("  updated:    {}", record.updated_at);
    println!("  original:   {}", collection.original_path(record)?.display());
    println!("  thumbnail:  {}", collection.thumbnail_path(record)?.display());
    Ok(())
}

pub fn show(collection: &Collection, id: &str) -> Result<()> {
    let record = collection.get_image(id)?;
    print_record(collection, &record)
}

pub fn set_status(collection: &mut Collection, id: &str, status: &str) -> Result<()> {
    let status: ImageStatus = status.parse()?;
    let record = collection.update_image_status(id, status)?;
    println!("{} is now {}", record.id, record.status);
    Ok(())
}

pub fn delete(collection: &mut Collection, id: &str) -> Result<()> {
    collection.delete_image(id)?;
    println!("Deleted image {id}");
    Ok(())
}

pub fn summary(collection: &Collection) -> Result<()> {
    let summary = collection.summary()?;
    println!("Collection {}", collection.id());
    println!("{}", "-".repeat(40));
    println!("  INBOX:      {}", summary.inbox);
    println!("  COLLECTION: {}", summary.collection);
    println!("  ARCHIVE:    {}", summary.archive);
    println!(
        "  total:      {} ({:.1} MB)",
        summary.total,
        summary.total_bytes as f64 / (1024.0 * 1024.0)
    );
    Ok(())
}
