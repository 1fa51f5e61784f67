//! Open-file accounting and positioned reads.
//!
//! # Overview
//!
//! [`HandleBudget`] is the single source of truth for how many file handles
//! the engine may hold at once. It is shared by every size-class being
//! resolved, so the ceiling holds process-wide even when classes run in
//! parallel.
//!
//! [`HandleTable`] belongs to one size-class. In open mode it keeps one
//! positioned handle per live candidate, covered by a [`Reservation`]
//! taken from the budget. In close mode it holds nothing and every read
//! borrows a single slot for one open/seek/read/close cycle.
//!
//! A session holding a reservation never waits on the budget, and a
//! session waiting on the budget holds nothing, so waiting cannot
//! deadlock.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use super::groups::FileId;

#[derive(Debug, Default)]
struct BudgetState {
    in_use: usize,
    peak: usize,
}

impl BudgetState {
    fn take(&mut self, slots: usize) {
        self.in_use += slots;
        self.peak = self.peak.max(self.in_use);
    }
}

/// Process-wide ceiling on simultaneously open handles.
#[derive(Debug)]
pub struct HandleBudget {
    capacity: usize,
    state: Mutex<BudgetState>,
    released: Condvar,
}

impl HandleBudget {
    /// Create a budget allowing `capacity` open handles (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(BudgetState::default()),
            released: Condvar::new(),
        }
    }

    /// Maximum number of handles that may be open at once.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently handed out.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.lock().in_use
    }

    /// Highest number of slots ever handed out at the same time.
    #[must_use]
    pub fn peak(&self) -> usize {
        self.lock().peak
    }

    /// Reserve `slots` without waiting, or `None` if they are not free.
    #[must_use]
    pub fn try_reserve(&self, slots: usize) -> Option<Reservation<'_>> {
        let mut state = self.lock();
        if slots > self.capacity - state.in_use {
            return None;
        }
        state.take(slots);
        Some(Reservation {
            budget: self,
            slots,
        })
    }

    /// Reserve `slots` (clamped to the capacity), waiting until they are free.
    pub fn reserve(&self, slots: usize) -> Reservation<'_> {
        let slots = slots.min(self.capacity);
        let mut state = self.lock();
        while self.capacity - state.in_use < slots {
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.take(slots);
        Reservation {
            budget: self,
            slots,
        }
    }

    fn release(&self, slots: usize) {
        if slots == 0 {
            return;
        }
        self.lock().in_use -= slots;
        self.released.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, BudgetState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Slots taken from a [`HandleBudget`], returned on drop.
#[derive(Debug)]
pub struct Reservation<'a> {
    budget: &'a HandleBudget,
    slots: usize,
}

impl Reservation<'_> {
    /// Number of slots held.
    #[must_use]
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Give back every slot above `slots`.
    pub fn shrink_to(&mut self, slots: usize) {
        if slots < self.slots {
            self.budget.release(self.slots - slots);
            self.slots = slots;
        }
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.budget.release(self.slots);
    }
}

/// Read exactly `len` bytes into `buf`, replacing its contents.
///
/// # Errors
///
/// Fails with [`io::ErrorKind::UnexpectedEof`] when the reader ends early.
pub fn read_block<R: Read>(reader: &mut R, len: u64, buf: &mut Vec<u8>) -> io::Result<()> {
    buf.clear();
    reader.by_ref().take(len).read_to_end(buf)?;
    if (buf.len() as u64) < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {len} bytes, got {}", buf.len()),
        ));
    }
    Ok(())
}

#[derive(Debug)]
struct OpenHandle {
    file: File,
    position: u64,
}

/// Handles of one size-class.
#[derive(Debug)]
pub struct HandleTable<'a> {
    budget: &'a HandleBudget,
    reservation: Option<Reservation<'a>>,
    open: HashMap<FileId, OpenHandle>,
}

impl<'a> HandleTable<'a> {
    /// Create an empty table drawing on `budget`.
    #[must_use]
    pub fn new(budget: &'a HandleBudget) -> Self {
        Self {
            budget,
            reservation: None,
            open: HashMap::new(),
        }
    }

    /// Number of handles currently open.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Whether handles may stay open (a reservation is held).
    #[must_use]
    pub fn is_open_mode(&self) -> bool {
        self.reservation.is_some()
    }

    /// Switch to open mode for a round with `live` candidates.
    ///
    /// Returns `false`, holding nothing, when the budget cannot cover
    /// `live` handles right now.
    pub fn enter_open_mode(&mut self, live: usize) -> bool {
        if let Some(reservation) = self.reservation.as_mut() {
            if live <= reservation.slots() {
                debug_assert!(self.open.len() <= live);
                reservation.shrink_to(live);
                return true;
            }
        }

        self.close_all();
        match self.budget.try_reserve(live) {
            Some(reservation) => {
                self.reservation = Some(reservation);
                true
            }
            None => false,
        }
    }

    /// Switch to close mode: every handle is closed and the reservation returned.
    pub fn enter_close_mode(&mut self) {
        self.close_all();
    }

    /// Close the handle of one file, if open.
    pub fn close(&mut self, id: FileId) {
        self.open.remove(&id);
    }

    /// Close every handle and return the reservation.
    pub fn close_all(&mut self) {
        self.open.clear();
        self.reservation = None;
    }

    /// Read `len` bytes at `offset` through a handle kept open for `id`.
    ///
    /// The handle is opened lazily and only sought when its position does
    /// not already match `offset`.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from opening, seeking or reading.
    pub fn read_open(
        &mut self,
        id: FileId,
        path: &Path,
        offset: u64,
        len: u64,
        buf: &mut Vec<u8>,
    ) -> io::Result<()> {
        let allowed = self.reservation.as_ref().map_or(0, Reservation::slots);
        debug_assert!(
            self.open.contains_key(&id) || self.open.len() < allowed,
            "opening a handle beyond the reservation"
        );
        let handle = match self.open.entry(id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(OpenHandle {
                file: File::open(path)?,
                position: 0,
            }),
        };

        if handle.position != offset {
            handle.file.seek(SeekFrom::Start(offset))?;
            handle.position = offset;
        }
        read_block(&mut handle.file, len, buf)?;
        handle.position += len;
        Ok(())
    }

    /// Read `len` bytes at `offset` with a one-shot open/seek/read/close.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from opening, seeking or reading.
    pub fn read_closed(
        &self,
        path: &Path,
        offset: u64,
        len: u64,
        buf: &mut Vec<u8>,
    ) -> io::Result<()> {
        debug_assert!(self.reservation.is_none());
        let _slot = self.budget.reserve(1);
        let mut file = File::open(path)?;
        if offset > 0 {
            file.seek(SeekFrom::Start(offset))?;
        }
        read_block(&mut file, len, buf)
    }

    /// Stream the first `size` bytes of `path` in `block_size` pieces.
    ///
    /// One handle is held for the whole pass.
    ///
    /// # Errors
    ///
    /// Returns any I/O error; a file shorter than `size` fails with
    /// [`io::ErrorKind::UnexpectedEof`].
    pub fn read_sequential(
        &self,
        path: &Path,
        size: u64,
        block_size: u64,
        buf: &mut Vec<u8>,
        mut consume: impl FnMut(&[u8]),
    ) -> io::Result<()> {
        debug_assert!(self.reservation.is_none());
        let _slot = self.budget.reserve(1);
        let mut file = File::open(path)?;
        let mut offset = 0;
        while offset < size {
            let len = block_size.min(size - offset);
            read_block(&mut file, len, buf)?;
            consume(buf);
            offset += len;
        }
        Ok(())
    }
}

impl Drop for HandleTable<'_> {
    fn drop(&mut self) {
        // Handles must go before the reservation that covers them.
        self.open.clear();
    }
}
