//! Roster seeding and persistence.
//!
//! A roster file is plain text: the first line holds the number of records,
//! then one record per line as `<kind-code> <x> <y>`, with kind codes from
//! [`Kind::code`]. Blank lines are ignored. Coordinates outside the field
//! are clamped on load rather than rejected, so a roster saved on a larger
//! grid still loads on a smaller one.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use rand::Rng;
use skirmish_agents::{Agent, FightObserver};
use skirmish_types::{Bounds, Kind, Position};
use tracing::info;

/// Errors that can occur while reading or writing a roster.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    /// The roster file could not be read or written.
    #[error("roster I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A line could not be parsed.
    #[error("roster line {line}: {reason}")]
    Parse {
        /// 1-based line number of the offending line.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// The header promised a different number of records than the file holds.
    #[error("roster header declares {declared} records but {found} were found")]
    CountMismatch {
        /// Count from the header line.
        declared: usize,
        /// Records actually present.
        found: usize,
    },
}

/// One persisted agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterRecord {
    /// The agent's kind.
    pub kind: Kind,
    /// The agent's position.
    pub position: Position,
}

impl RosterRecord {
    /// Capture an agent's kind and current position.
    pub fn of(agent: &Agent) -> Self {
        Self {
            kind: agent.kind(),
            position: agent.position(),
        }
    }

    /// Build a live agent from this record, subscribed to `observers`.
    pub fn into_agent(self, observers: &[Arc<dyn FightObserver>]) -> Agent {
        observers
            .iter()
            .fold(Agent::new(self.kind, self.position), |agent, observer| {
                agent.with_observer(Arc::clone(observer))
            })
    }
}

/// Create `count` agents of random kinds at random positions.
pub fn seed_roster<R: Rng>(
    rng: &mut R,
    count: u32,
    bounds: Bounds,
    observers: &[Arc<dyn FightObserver>],
) -> Vec<Agent> {
    (0..count)
        .map(|_| {
            let kind = Kind::ALL
                .get(rng.random_range(0..Kind::ALL.len()))
                .copied()
                .unwrap_or(Kind::Dragon);
            let position = Position::new(
                rng.random_range(0..bounds.width.max(1)),
                rng.random_range(0..bounds.height.max(1)),
            );
            RosterRecord { kind, position }.into_agent(observers)
        })
        .collect()
}

/// Write `records` in roster format.
///
/// # Errors
///
/// Returns [`RosterError::Io`] if writing fails.
pub fn write_roster<W: Write>(mut writer: W, records: &[RosterRecord]) -> Result<(), RosterError> {
    writeln!(writer, "{}", records.len())?;
    for record in records {
        writeln!(
            writer,
            "{} {} {}",
            record.kind.code(),
            record.position.x,
            record.position.y
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Read roster records, clamping positions into `bounds`.
///
/// # Errors
///
/// Returns [`RosterError::Parse`] for malformed lines,
/// [`RosterError::CountMismatch`] if the header count is wrong, or
/// [`RosterError::Io`] if reading fails.
pub fn read_roster<R: BufRead>(reader: R, bounds: Bounds) -> Result<Vec<RosterRecord>, RosterError> {
    let mut declared: Option<usize> = None;
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index.saturating_add(1);
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if declared.is_none() {
            let count = trimmed.parse::<usize>().map_err(|err| RosterError::Parse {
                line: line_no,
                reason: format!("invalid record count {trimmed:?}: {err}"),
            })?;
            declared = Some(count);
            continue;
        }
        records.push(parse_record(trimmed, line_no, bounds)?);
    }

    let declared = declared.unwrap_or(0);
    if declared != records.len() {
        return Err(RosterError::CountMismatch {
            declared,
            found: records.len(),
        });
    }
    Ok(records)
}

fn parse_record(line: &str, line_no: usize, bounds: Bounds) -> Result<RosterRecord, RosterError> {
    let parse_err = |reason: String| RosterError::Parse {
        line: line_no,
        reason,
    };
    let mut fields = line.split_whitespace();
    let (Some(code), Some(x), Some(y), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(parse_err(format!("expected `<kind> <x> <y>`, got {line:?}")));
    };

    let code = code
        .parse::<u8>()
        .map_err(|err| parse_err(format!("invalid kind code {code:?}: {err}")))?;
    let kind = Kind::from_code(code).ok_or_else(|| parse_err(format!("unknown kind code {code}")))?;
    let x = x
        .parse::<u32>()
        .map_err(|err| parse_err(format!("invalid x {x:?}: {err}")))?;
    let y = y
        .parse::<u32>()
        .map_err(|err| parse_err(format!("invalid y {y:?}: {err}")))?;

    Ok(RosterRecord {
        kind,
        position: bounds.clamp(Position::new(x, y)),
    })
}

/// Save the given agents to `path`.
///
/// # Errors
///
/// Returns [`RosterError::Io`] if the file cannot be created or written.
pub fn save(path: &Path, agents: &[Arc<Agent>]) -> Result<(), RosterError> {
    let records: Vec<RosterRecord> = agents.iter().map(|agent| RosterRecord::of(agent)).collect();
    let file = File::create(path)?;
    write_roster(BufWriter::new(file), &records)?;
    info!(path = %path.display(), count = records.len(), "Roster saved");
    Ok(())
}

/// Load roster records from `path`.
///
/// # Errors
///
/// Returns [`RosterError`] if the file cannot be read or parsed.
pub fn load(path: &Path, bounds: Bounds) -> Result<Vec<RosterRecord>, RosterError> {
    let file = File::open(path)?;
    let records = read_roster(BufReader::new(file), bounds)?;
    info!(path = %path.display(), count = records.len(), "Roster loaded");
    Ok(records)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use skirmish_agents::LogObserver;

    use super::*;

    const FIELD: Bounds = Bounds::new(100, 100);

    #[test]
    fn writes_count_prefixed_records() {
        let records = [
            RosterRecord {
                kind: Kind::Dragon,
                position: Position::new(1, 2),
            },
            RosterRecord {
                kind: Kind::KnightErrant,
                position: Position::new(30, 40),
            },
        ];
        let mut out = Vec::new();
        write_roster(&mut out, &records).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "2\n1 1 2\n3 30 40\n");
    }

    #[test]
    fn reads_what_it_writes() {
        let input = "3\n1 10 20\n2 0 99\n\n3 55 5\n";
        let records = read_roster(input.as_bytes(), FIELD).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records.get(1).unwrap().kind, Kind::Elf);
        assert_eq!(records.get(2).unwrap().position, Position::new(55, 5));

        let mut out = Vec::new();
        write_roster(&mut out, &records).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "3\n1 10 20\n2 0 99\n3 55 5\n");
    }

    #[test]
    fn positions_are_clamped_on_load() {
        let records = read_roster("1\n2 500 100\n".as_bytes(), FIELD).unwrap();
        assert_eq!(records.first().unwrap().position, Position::new(99, 99));
    }

    #[test]
    fn unknown_kind_reports_line() {
        let err = read_roster("2\n1 1 1\n9 1 1\n".as_bytes(), FIELD).unwrap_err();
        assert!(matches!(err, RosterError::Parse { line: 3, .. }), "{err}");
    }

    #[test]
    fn short_record_is_rejected() {
        let err = read_roster("1\n1 5\n".as_bytes(), FIELD).unwrap_err();
        assert!(matches!(err, RosterError::Parse { line: 2, .. }));
    }

    #[test]
    fn bad_header_is_rejected() {
        let err = read_roster("many\n".as_bytes(), FIELD).unwrap_err();
        assert!(matches!(err, RosterError::Parse { line: 1, .. }));
    }

    #[test]
    fn count_mismatch_is_rejected() {
        let err = read_roster("3\n1 1 1\n".as_bytes(), FIELD).unwrap_err();
        assert!(matches!(
            err,
            RosterError::CountMismatch {
                declared: 3,
                found: 1
            }
        ));
    }

    #[test]
    fn empty_input_is_an_empty_roster() {
        assert!(read_roster("".as_bytes(), FIELD).unwrap().is_empty());
    }

    #[test]
    fn seeding_places_agents_on_the_field() {
        let mut rng = StdRng::seed_from_u64(3);
        let observers: Vec<Arc<dyn FightObserver>> = vec![Arc::new(LogObserver)];
        let agents = seed_roster(&mut rng, 50, Bounds::new(10, 20), &observers);
        assert_eq!(agents.len(), 50);
        assert!(agents.iter().all(|agent| agent.is_alive()));
        assert!(agents.iter().all(|agent| Bounds::new(10, 20).contains(agent.position())));
        assert!(agents.iter().all(|agent| agent.observers().len() == 1));
    }

    #[test]
    fn save_and_load_through_a_file() {
        let path = std::env::temp_dir().join(format!("skirmish-roster-{}.txt", std::process::id()));
        let agents: Vec<Arc<Agent>> = vec![
            Arc::new(Agent::new(Kind::Elf, Position::new(7, 8))),
            Arc::new(Agent::new(Kind::Dragon, Position::new(9, 10))),
        ];
        save(&path, &agents).unwrap();
        let records = load(&path, FIELD).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(
            records,
            vec![
                RosterRecord {
                    kind: Kind::Elf,
                    position: Position::new(7, 8)
                },
                RosterRecord {
                    kind: Kind::Dragon,
                    position: Position::new(9, 10)
                },
            ]
        );
    }
}
