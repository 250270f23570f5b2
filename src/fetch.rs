//! Lazy traversal of paginated listings.

use std::future::Future;
use std::ops::ControlFlow;

use futures_util::{Stream, TryStreamExt, stream};
use log::{debug, warn};

use crate::error::Result;
use crate::github::{Branch, Page, Release, ReleaseApi};

pub const DEFAULT_ITEMS_PER_PAGE: u32 = 20;

struct Cursor<T, F> {
    loader: F,
    items: std::vec::IntoIter<T>,
    per_page: u32,
    page: u32,
    next: u32,
}

/// Streams `(item, page)` pairs in server order, starting at `start_page`.
///
/// A page is only requested once the previous one is drained; the stream
/// ends after a page without a next link. The first error ends it too.
pub fn paginate<'a, T, F, Fut>(
    start_page: u32,
    per_page: u32,
    loader: F,
) -> impl Stream<Item = Result<(T, u32)>> + 'a
where
    T: 'a,
    F: FnMut(u32, u32) -> Fut + 'a,
    Fut: Future<Output = Result<Page<T>>> + 'a,
{
    let cursor = Cursor {
        loader,
        items: Vec::new().into_iter(),
        per_page: if per_page < 1 {
            DEFAULT_ITEMS_PER_PAGE
        } else {
            per_page
        },
        page: 0,
        next: start_page.max(1),
    };

    stream::try_unfold(cursor, |mut cursor| async move {
        loop {
            if let Some(item) = cursor.items.next() {
                let page = cursor.page;
                return Ok(Some(((item, page), cursor)));
            }
            if cursor.next == 0 {
                return Ok(None);
            }

            debug!("fetching page {} ({} per page)", cursor.next, cursor.per_page);
            let loaded = (cursor.loader)(cursor.per_page, cursor.next).await?;
            cursor.page = cursor.next;
            cursor.next = loaded.next_page;
            cursor.items = loaded.items.into_iter();

            if cursor.next != 0 && cursor.next <= cursor.page {
                warn!(
                    "next page {} does not follow page {}, stopping",
                    cursor.next, cursor.page
                );
                cursor.next = 0;
            }
        }
    })
}

/// Every release of the repository, newest first as the server orders them.
pub fn releases<'a, A>(
    api: &'a A,
    per_page: u32,
) -> impl Stream<Item = Result<(Release, u32)>> + 'a
where
    A: ReleaseApi + ?Sized,
{
    paginate(1, per_page, move |per_page, page| {
        api.list_releases(per_page, page)
    })
}

/// Every branch of the repository.
pub fn branches<'a, A>(api: &'a A, per_page: u32) -> impl Stream<Item = Result<(Branch, u32)>> + 'a
where
    A: ReleaseApi + ?Sized,
{
    paginate(1, per_page, move |per_page, page| {
        api.list_branches(per_page, page)
    })
}

/// Calls `callback` for each item until the stream ends, the callback
/// breaks, or an error occurs.
pub async fn fetch<T, S, C>(stream: S, mut callback: C) -> Result<()>
where
    S: Stream<Item = Result<(T, u32)>>,
    C: FnMut(T, u32) -> Result<ControlFlow<()>>,
{
    futures_util::pin_mut!(stream);
    while let Some((item, page)) = stream.try_next().await? {
        if callback(item, page)?.is_break() {
            debug!("fetch stopped early on page {}", page);
            break;
        }
    }
    Ok(())
}
