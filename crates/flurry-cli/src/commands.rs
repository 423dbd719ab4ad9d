use anyhow::{Context, bail};
use flurry::{Clock, Engine, FlakeId, MonotonicClock, Options, SystemClock};
use std::io::Write;

/// Starts an engine, writes `count` IDs to `out` and stops the engine again.
pub fn generate<W: Write>(
    options: Options,
    monotonic: bool,
    count: u64,
    padded: bool,
    out: &mut W,
) -> anyhow::Result<()> {
    if monotonic {
        generate_with(options, MonotonicClock::new(), count, padded, out)
    } else {
        generate_with(options, SystemClock, count, padded, out)
    }
}

pub fn generate_with<C: Clock, W: Write>(
    options: Options,
    clock: C,
    count: u64,
    padded: bool,
    out: &mut W,
) -> anyhow::Result<()> {
    let engine = Engine::with_clock(options, clock).context("failed to start engine")?;

    let written = (0..count).try_for_each(|_| {
        let id = engine.next_id();
        if padded {
            writeln!(out, "{}", id.to_padded_string())
        } else {
            writeln!(out, "{id}")
        }
    });

    engine.stop().context("failed to stop engine")?;
    written.context("failed to write ids")?;
    out.flush().context("failed to flush output")?;

    tracing::debug!(count = engine.count(), "generated ids");
    Ok(())
}

/// Writes the fields of each raw ID, one line per ID.
pub fn decode<W: Write>(options: Options, ids: &[u64], out: &mut W) -> anyhow::Result<()> {
    let epoch_ms = u64::try_from(options.epoch.as_millis()).unwrap_or(u64::MAX);

    for &raw in ids {
        let id = FlakeId::from_raw(raw);
        if raw >> 63 != 0 {
            tracing::warn!(raw, "reserved bit is set; not an id from this layout");
        }
        let Some(unix_ms) = epoch_ms.checked_add(id.timestamp()) else {
            bail!(
                "id {raw} with timestamp {} overflows a u64 millisecond past epoch {epoch_ms}",
                id.timestamp()
            );
        };
        writeln!(
            out,
            "{raw}\ttimestamp={}\tunix_ms={unix_ms}\tinstance_id={}\tsequence={}",
            id.timestamp(),
            id.instance_id(),
            id.sequence()
        )
        .context("failed to write decoded id")?;
    }

    out.flush().context("failed to flush output")?;
    Ok(())
}
