use anyhow::Result;

use storyreel::StoryStore;

pub async fn cmd_list(store_root: &str) -> Result<()> {
    let store = StoryStore::new(store_root);
    let ids = store.list().await?;

    if ids.is_empty() {
        eprintln!("No completed stories in {store_root}");
        return Ok(());
    }

    for id in ids {
        println!("{id}");
    }
    Ok(())
}
