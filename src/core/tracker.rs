use crate::core::auth::AccessGate;
use crate::core::grid::count_completed_lines;
use crate::core::map::GlobalMap;
use crate::core::roster::Roster;
use crate::domain::model::{Position, Role, Student, StudentId};
use crate::domain::ports::{Celebration, Quiet, Storage};
use crate::utils::error::Result;

pub const SECRET_SLOT: &str = "bingoAdminPwd";

/// Storage slot names for one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotKeys {
    pub students: String,
    pub secret: String,
}

impl SlotKeys {
    pub fn for_class(class_id: &str) -> Self {
        Self {
            students: format!("bingoStudents_{}", class_id),
            secret: SECRET_SLOT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add { name: String },
    Remove { id: StudentId, confirmed: bool },
    Increment { id: StudentId, position: Position },
    Decrement { id: StudentId, position: Position },
    Import { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Guest role, nothing happened.
    Refused,
    NeedsConfirmation,
    UnknownStudent,
    Unchanged,
    Added(StudentId),
    Removed,
    Counted {
        count: u32,
        lines_before: usize,
        lines_after: usize,
    },
    Imported(usize),
}

impl CommandOutcome {
    pub fn new_line(&self) -> bool {
        matches!(self, CommandOutcome::Counted { lines_before, lines_after, .. } if lines_after > lines_before)
    }

    fn changed_state(&self) -> bool {
        match self {
            CommandOutcome::Added(_) | CommandOutcome::Removed | CommandOutcome::Counted { .. } => true,
            CommandOutcome::Imported(n) => *n > 0,
            _ => false,
        }
    }
}

/// Owns the roster, the admin gate and the slot store for one class.
pub struct BingoTracker<S: Storage> {
    storage: S,
    keys: SlotKeys,
    roster: Roster,
    gate: AccessGate,
    celebration: Box<dyn Celebration>,
}

impl<S: Storage> BingoTracker<S> {
    /// 啟動時載入一次名單與密碼
    pub async fn open(storage: S, keys: SlotKeys, default_secret: &str) -> Result<Self> {
        let roster = match storage.read_slot(&keys.students).await? {
            Some(bytes) => Roster::from_slot_bytes(&bytes),
            None => Roster::new(),
        };
        let gate = AccessGate::load(&storage, &keys.secret, default_secret).await?;
        tracing::debug!("Loaded {} students from slot {}", roster.len(), keys.students);

        Ok(Self {
            storage,
            keys,
            roster,
            gate,
            celebration: Box::new(Quiet),
        })
    }

    pub fn with_celebration(mut self, celebration: impl Celebration + 'static) -> Self {
        self.celebration = Box::new(celebration);
        self
    }

    pub fn role(&self) -> Role {
        self.gate.role()
    }

    pub fn is_admin(&self) -> bool {
        self.gate.is_admin()
    }

    pub fn login(&mut self, attempt: &str) -> Result<()> {
        self.gate.login(attempt)
    }

    pub fn logout(&mut self) {
        self.gate.logout();
    }

    pub async fn change_secret(&mut self, current: &str, new_secret: &str) -> Result<bool> {
        self.gate
            .change_secret(&self.storage, current, new_secret)
            .await
    }

    /// Single entry point for every roster mutation.
    pub async fn execute(&mut self, command: Command) -> Result<CommandOutcome> {
        if !self.gate.is_admin() {
            tracing::debug!("Refusing {:?} in guest mode", command);
            return Ok(CommandOutcome::Refused);
        }

        let outcome = self.apply(command.clone());
        if outcome.changed_state() {
            self.persist().await?;
        }

        if outcome.new_line() {
            if let Command::Increment { id, .. } = &command {
                if let (Some(student), CommandOutcome::Counted { lines_after, .. }) =
                    (self.roster.find(id), &outcome)
                {
                    self.celebration.celebrate(student, *lines_after);
                }
            }
        }

        Ok(outcome)
    }

    fn apply(&mut self, command: Command) -> CommandOutcome {
        match command {
            Command::Add { name } => match self.roster.add(&name) {
                Some(id) => {
                    tracing::info!("➕ Added student {} ({})", name.trim(), id);
                    CommandOutcome::Added(id)
                }
                None => CommandOutcome::Unchanged,
            },
            Command::Remove { confirmed: false, .. } => CommandOutcome::NeedsConfirmation,
            Command::Remove { id, confirmed: true } => {
                if self.roster.remove(&id) {
                    tracing::info!("➖ Removed student {}", id);
                    CommandOutcome::Removed
                } else {
                    CommandOutcome::Unchanged
                }
            }
            Command::Increment { id, position } => {
                let Some(student) = self.roster.find_mut(&id) else {
                    return CommandOutcome::UnknownStudent;
                };
                let lines_before = count_completed_lines(&student.card_counts);
                student.card_counts.increment(position);
                let lines_after = count_completed_lines(&student.card_counts);
                tracing::info!("{} collected #{}", student.name, position);
                CommandOutcome::Counted {
                    count: student.card_counts.get(position),
                    lines_before,
                    lines_after,
                }
            }
            Command::Decrement { id, position } => {
                let Some(student) = self.roster.find_mut(&id) else {
                    return CommandOutcome::UnknownStudent;
                };
                let lines_before = count_completed_lines(&student.card_counts);
                if !student.card_counts.decrement(position) {
                    return CommandOutcome::Unchanged;
                }
                tracing::info!("{} returned #{}", student.name, position);
                CommandOutcome::Counted {
                    count: student.card_counts.get(position),
                    lines_before,
                    lines_after: count_completed_lines(&student.card_counts),
                }
            }
            Command::Import { text } => {
                let added = self.roster.bulk_import(&text);
                tracing::info!("📥 Imported {} students", added);
                CommandOutcome::Imported(added)
            }
        }
    }

    /// Whole-roster replace.
    async fn persist(&self) -> Result<()> {
        let bytes = self.roster.to_slot_bytes()?;
        self.storage.write_slot(&self.keys.students, &bytes).await?;
        tracing::debug!("Saved {} students to {}", self.roster.len(), self.keys.students);
        Ok(())
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn students(&self) -> &[Student] {
        self.roster.students()
    }

    pub fn student(&self, id: &StudentId) -> Option<&Student> {
        self.roster.find(id)
    }

    /// Looks a student up by id, falling back to an exact name match.
    pub fn resolve(&self, reference: &str) -> Option<&Student> {
        self.roster
            .find(&StudentId::from(reference))
            .or_else(|| self.roster.find_by_name(reference))
    }

    pub fn ranked(&self) -> Vec<&Student> {
        self.roster.rank()
    }

    pub fn total_collected(&self) -> u64 {
        self.roster.total_collected()
    }

    pub fn map_for(&self, id: Option<&StudentId>) -> GlobalMap {
        GlobalMap::for_student(id.and_then(|id| self.roster.find(id)))
    }

    pub fn keys(&self) -> &SlotKeys {
        &self.keys
    }
}
