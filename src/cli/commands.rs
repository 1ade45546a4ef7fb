use anyhow::{Context, Result};
use crossterm::terminal;

use notes_cli::{Database, Draft, DraftsRepository, Error, Note, NotesRepository};

use crate::{
    app::AppContext,
    cli::args::{Cli, Command, DraftCommand, DraftFields},
    format,
};

pub(crate) fn dispatch(app: &AppContext, cli: Cli) -> Result<()> {
    match cli.command {
        Command::Add { title, description } => {
            add_note(app, Draft::new(title, description.unwrap_or_default()))
        }
        Command::List => print_notes(&NotesRepository::new(app.db()).get_all()?),
        Command::Search { text } => {
            print_notes(&NotesRepository::new(app.db()).get_by_text(&text)?)
        }
        Command::Show { id } => show_note(app, id),
        Command::Remove { id } => {
            remove_note(app.db(), id)?;
            println!("Removed note {}", id);
            Ok(())
        }
        Command::Draft(command) => run_draft_command(app, command),
        Command::Version => {
            println!("notes {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn add_note(app: &AppContext, draft: Draft) -> Result<()> {
    let id = NotesRepository::new(app.db()).insert(&draft)?;
    println!("Added note {}", id);
    Ok(())
}

fn print_notes(notes: &[Note]) -> Result<()> {
    let terminal_width = terminal::size()
        .map(|(width, _)| width as usize)
        .unwrap_or(80);
    for note in notes {
        let display_time = format::format_display_time(&note.last_update_date);
        let line = format::format_note_line(
            note.id,
            &display_time,
            &note.title,
            &note.description,
            terminal_width,
        );
        println!("{}", line);
    }
    Ok(())
}

fn show_note(app: &AppContext, id: i64) -> Result<()> {
    let note = NotesRepository::new(app.db())
        .get(id)?
        .ok_or(Error::NoteNotFound(id))?;
    println!(
        "#{}  {}",
        note.id,
        format::format_display_time(&note.last_update_date)
    );
    println!("{}", note.title);
    if !note.description.is_empty() {
        println!("\n{}", note.description);
    }

    if let Some(draft) = DraftsRepository::new(app.db()).get_existing(id)? {
        println!("\nPending draft:");
        print_draft(&draft);
    }
    Ok(())
}

fn remove_note(db: &dyn Database, id: i64) -> Result<()> {
    let notes = NotesRepository::new(db);
    let mut drafts = DraftsRepository::new(db);
    db.execute_transaction(&mut || {
        notes.delete_with_id(id)?;
        drafts.delete_existing(id)
    })?;
    Ok(())
}

fn run_draft_command(app: &AppContext, command: DraftCommand) -> Result<()> {
    let db = app.db();
    let mut drafts = DraftsRepository::new(db);

    match command {
        DraftCommand::New(fields) => {
            apply_fields(&mut drafts, None, fields)?;
            drafts.persist().context("saving the draft")?;
            show_draft(drafts.get_new()?);
        }
        DraftCommand::Edit { id, fields } => {
            edit_draft(db, &mut drafts, id, fields)?;
            show_draft(drafts.get_existing(id)?);
        }
        DraftCommand::Show { id } => {
            let draft = match id {
                Some(id) => drafts.get_existing(id)?,
                None => drafts.get_new()?,
            };
            show_draft(draft);
        }
        DraftCommand::Discard { all: true, .. } => drafts.delete_all()?,
        DraftCommand::Discard { id: Some(id), .. } => drafts.delete_existing(id)?,
        DraftCommand::Discard { id: None, .. } => drafts.delete_new()?,
        DraftCommand::Publish { id: None } => {
            let id = publish_new(db, &mut drafts)?;
            println!("Added note {}", id);
        }
        DraftCommand::Publish { id: Some(id) } => {
            publish_existing(db, &mut drafts, id)?;
            println!("Updated note {}", id);
        }
    }
    Ok(())
}

/// Applies `fields` to the draft of note `id` and saves it. The first edit
/// starts from the note itself so the field left alone keeps its value.
fn edit_draft(
    db: &dyn Database,
    drafts: &mut DraftsRepository<'_>,
    id: i64,
    fields: DraftFields,
) -> Result<()> {
    let note = NotesRepository::new(db)
        .get(id)?
        .ok_or(Error::NoteNotFound(id))?;
    if drafts.get_existing(id)?.is_none() {
        drafts.update_existing_title(id, note.title)?;
        drafts.update_existing_description(id, note.description)?;
    }
    apply_fields(drafts, Some(id), fields)?;
    drafts.persist().context("saving the draft")?;
    Ok(())
}

/// Turns the new-note draft into a note and drops the draft, as one unit.
fn publish_new(db: &dyn Database, drafts: &mut DraftsRepository<'_>) -> Result<i64> {
    let notes = NotesRepository::new(db);
    let draft = drafts.get_new()?.context("there is no draft to publish")?;
    let mut id = 0;
    db.execute_transaction(&mut || {
        id = notes.insert(&draft)?;
        drafts.delete_new()
    })?;
    Ok(id)
}

/// Writes the draft of note `id` into the note and drops the draft, as one
/// unit.
fn publish_existing(
    db: &dyn Database,
    drafts: &mut DraftsRepository<'_>,
    id: i64,
) -> Result<()> {
    let notes = NotesRepository::new(db);
    let draft = drafts
        .get_existing(id)?
        .with_context(|| format!("note {} has no draft to publish", id))?;
    db.execute_transaction(&mut || {
        notes.update(id, &draft)?;
        drafts.delete_existing(id)
    })?;
    Ok(())
}

fn apply_fields(
    drafts: &mut DraftsRepository<'_>,
    id: Option<i64>,
    fields: DraftFields,
) -> Result<()> {
    match id {
        Some(id) => {
            if let Some(title) = fields.title {
                drafts.update_existing_title(id, title)?;
            }
            if let Some(description) = fields.description {
                drafts.update_existing_description(id, description)?;
            }
        }
        None => {
            if let Some(title) = fields.title {
                drafts.update_new_title(title)?;
            }
            if let Some(description) = fields.description {
                drafts.update_new_description(description)?;
            }
        }
    }
    Ok(())
}

fn show_draft(draft: Option<Draft>) {
    match draft {
        Some(draft) => print_draft(&draft),
        None => println!("No draft"),
    }
}

fn print_draft(draft: &Draft) {
    println!("Title: {}", draft.title());
    println!("Description: {}", draft.description());
}
