//! Page-level state.
//!
//! One object holds everything about the triage page that is not per item:
//! load status, session identity, the viewed bucket, lookups, the open detail
//! view and the notice stack. Per-item state lives in the item store.

use crate::domain::{Bucket, CategoryCatalog, EmailId, Folder};
use crate::providers::backend::Identity;
use crate::services::TaskId;

use super::events::{Notice, NoticeId};

/// Load status of the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageStatus {
    /// Nothing fetched yet, or a fetch is running.
    #[default]
    Loading,
    /// The item list rendered.
    Ready,
    /// No session. The host shows a connect-account prompt.
    AuthRequired,
    /// The primary item fetch failed.
    Failed {
        /// Error message.
        message: String,
    },
}

#[derive(Debug, Clone)]
struct NoticeSlot {
    notice: Notice,
    expiry: Option<TaskId>,
}

/// State for the triage page.
#[derive(Debug, Clone)]
pub struct PageState {
    /// Load status.
    pub status: PageStatus,
    /// Signed-in user, once known.
    pub identity: Option<Identity>,
    /// Bucket whose items are listed.
    pub bucket: Bucket,
    /// Every known category.
    pub categories: CategoryCatalog,
    /// Known folders.
    pub folders: Vec<Folder>,
    /// Total matching items reported by the last fetch.
    pub total: u32,
    /// Item whose detail view is open.
    pub open_detail: Option<EmailId>,
    notices: Vec<NoticeSlot>,
    next_notice: u64,
}

impl PageState {
    /// Creates state for a page listing `bucket`.
    pub fn new(bucket: Bucket) -> Self {
        Self {
            status: PageStatus::Loading,
            identity: None,
            bucket,
            categories: CategoryCatalog::default(),
            folders: Vec::new(),
            total: 0,
            open_detail: None,
            notices: Vec::new(),
            next_notice: 1,
        }
    }

    /// Returns true once the item list has rendered.
    pub fn is_ready(&self) -> bool {
        self.status == PageStatus::Ready
    }

    /// Allocates an ID for a new notice.
    pub fn next_notice_id(&mut self) -> NoticeId {
        let id = NoticeId(self.next_notice);
        self.next_notice += 1;
        id
    }

    /// Adds a notice, with the timer that will expire it if any.
    pub fn push_notice(&mut self, notice: Notice, expiry: Option<TaskId>) {
        self.notices.push(NoticeSlot { notice, expiry });
    }

    /// Removes a notice. Returns the expiry timer still to cancel, if any.
    pub fn remove_notice(&mut self, id: NoticeId) -> Option<(Notice, Option<TaskId>)> {
        let index = self.notices.iter().position(|slot| slot.notice.id == id)?;
        let slot = self.notices.remove(index);
        Some((slot.notice, slot.expiry))
    }

    /// Visible notices, oldest first.
    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter().map(|slot| &slot.notice)
    }

    /// Closes the detail view if it shows `id`. Returns true if it did.
    pub fn close_detail_for(&mut self, id: &EmailId) -> bool {
        if self.open_detail.as_ref() == Some(id) {
            self.open_detail = None;
            true
        } else {
            false
        }
    }
}
