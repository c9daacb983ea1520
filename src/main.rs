use anyhow::{Context, Result};
use datalake_utils::{
    create_client, init_tracing_once, list_documents_for_date, ClientOptions, KeepKeys, ReadDate, DEFAULT_STREAMSET,
};
use time::OffsetDateTime;

fn main() -> Result<()> {
    init_tracing_once();

    let mut args = std::env::args().skip(1);
    let index = args.next().context("usage: datalake-utils <index> [YYYY-MM-DD] [streamset]")?;
    let date = match args.next() {
        Some(s) => s.parse::<ReadDate>()?,
        None => ReadDate::new(OffsetDateTime::now_utc().date()),
    };
    let streamset = args.next().unwrap_or_else(|| DEFAULT_STREAMSET.to_string());

    let client = create_client(&ClientOptions::social()).context("creating social datalake client")?;
    let keep = KeepKeys::social_default();
    let mut docs = list_documents_for_date(&client, &streamset, &index, date, Some(&keep), false)
        .with_context(|| format!("listing {index} for {date}"))?;

    let mut count = 0u64;
    let mut first = None;
    for doc in docs.by_ref() {
        if first.is_none() {
            first = Some(doc);
        }
        count += 1;
    }

    println!("Read {} records from {} files ({} skipped)", count, docs.files_read(), docs.skipped().len());
    if let Some(doc) = first {
        println!("{}", serde_json::to_string_pretty(&doc)?);
    }
    Ok(())
}
