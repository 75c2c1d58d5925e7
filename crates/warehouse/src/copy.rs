//! COPY statements that bulk-load staging tables from S3.

use etl_core::literal::{ensure_literal_safe, quote_literal};
use etl_core::{CopyOptions, Error, JsonFormat, Result, Table};

/// Renders a `COPY` of JSON objects under `source` into a staging table.
///
/// The statement appends; staging is emptied by the drop/create phases.
pub fn copy_statement(
    table: Table,
    source: &str,
    format: &JsonFormat,
    options: &CopyOptions,
) -> Result<String> {
    if !table.is_staging() {
        return Err(Error::invalid_value(
            "COPY",
            format!("{} is not a staging table", table),
        ));
    }
    ensure_literal_safe("COPY source", source)?;
    ensure_literal_safe("COPY json", format.as_arg())?;
    ensure_literal_safe("COPY role", &options.role_arn)?;
    ensure_literal_safe("COPY region", &options.region)?;

    Ok(format!(
        "COPY {table}\nFROM {source}\nCREDENTIALS {credentials}\nREGION {region}\nJSON {json};",
        table = table.name(),
        source = quote_literal(source),
        credentials = quote_literal(&format!("aws_iam_role={}", options.role_arn)),
        region = quote_literal(&options.region),
        json = quote_literal(format.as_arg()),
    ))
}

/// Both staging loads: events with the JSONPaths mapping, songs with `auto`.
pub fn copy_statements(options: &CopyOptions) -> Result<Vec<(Table, String)>> {
    Ok(vec![
        (
            Table::StagingEvents,
            copy_statement(
                Table::StagingEvents,
                &options.log_data,
                &options.log_format,
                options,
            )?,
        ),
        (
            Table::StagingSongs,
            copy_statement(
                Table::StagingSongs,
                &options.song_data,
                &JsonFormat::Auto,
                options,
            )?,
        ),
    ])
}
