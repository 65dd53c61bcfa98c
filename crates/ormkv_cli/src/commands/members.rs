//! Member commands: add, update, put, remove, get and list.

use crate::directory::Member;
use ormkv_codec::Value;
use ormkv_core::{Connection, FieldNames, ListOptions, OrmResult, ReadConnection, SaveMode, Schema};
use ormkv_storage::{Backend, ReadBackend};
use tracing::info;

/// How `get` finds a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// By primary key.
    Id(u64),
    /// By the unique email index.
    Email(String),
}

/// Writes a member with the given save mode.
pub fn write<B: Backend + ?Sized>(
    schema: &Schema,
    backend: &mut B,
    member: &Member,
    mode: SaveMode,
) -> OrmResult<()> {
    let mut conn = Connection::new(schema, backend);
    conn.save_with(member, mode)?;
    conn.flush()?;
    info!(id = member.id, %mode, "member written");
    Ok(())
}

/// Removes the member with `id`.
pub fn remove<B: Backend + ?Sized>(schema: &Schema, backend: &mut B, id: u64) -> OrmResult<()> {
    let mut conn = Connection::new(schema, backend);
    let member = Member {
        id,
        email: String::new(),
        name: String::new(),
        team: String::new(),
    };
    conn.delete(&member)?;
    conn.flush()?;
    info!(id, "member removed");
    Ok(())
}

/// Looks up one member.
pub fn get<B: ReadBackend + ?Sized>(
    schema: &Schema,
    backend: &B,
    lookup: &Lookup,
) -> OrmResult<Option<Member>> {
    let conn = ReadConnection::new(schema, backend);
    match lookup {
        Lookup::Id(id) => conn.get(&FieldNames::parse("id")?, &[Value::Unsigned(*id)]),
        Lookup::Email(email) => conn.get(&FieldNames::parse("email")?, &[Value::from(email.as_str())]),
    }
}

/// Filters for `list`.
#[derive(Debug, Clone, Default)]
pub struct ListArgs {
    /// Only members of this team.
    pub team: Option<String>,
    /// Only members whose name contains this text.
    pub name_contains: Option<String>,
    /// Members to skip.
    pub offset: usize,
    /// Maximum number of members.
    pub limit: Option<usize>,
    /// Descending order.
    pub reverse: bool,
}

/// Lists members.
pub fn list<B: ReadBackend + ?Sized>(
    schema: &Schema,
    backend: &B,
    args: &ListArgs,
) -> OrmResult<Vec<Member>> {
    let mut options = ListOptions::<Member>::new().offset(args.offset);
    if let Some(team) = &args.team {
        options = options
            .index(FieldNames::parse("team")?)
            .prefix(vec![Value::from(team.as_str())]);
    }
    if let Some(needle) = args.name_contains.clone() {
        options = options.filter(move |member| member.name.contains(&needle));
    }
    if let Some(limit) = args.limit {
        options = options.limit(limit);
    }
    if args.reverse {
        options = options.reverse();
    }
    ReadConnection::new(schema, backend).list(options)?.collect()
}

/// Prints members as text or JSON.
pub fn print(members: &[Member], format: &str) -> Result<(), serde_json::Error> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(members)?),
        _ => {
            for member in members {
                println!(
                    "{:>6}  {:<28} {:<20} {}",
                    member.id, member.email, member.name, member.team
                );
            }
        }
    }
    Ok(())
}
