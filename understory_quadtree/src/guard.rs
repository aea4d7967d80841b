// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Locking discipline for tree nodes.
//!
//! Every node sits behind its own reader-writer lock and is shared through an
//! `Arc`, so a guard can own its node and outlive the guard of its parent.
//!
//! - Queries take read locks top-down and keep ancestors read-locked while they
//!   visit a subtree.
//! - Inserts and removes walk down with upgradable locks, acquiring a child before
//!   releasing its parent. Only one upgradable holder exists per node, so the
//!   node's counter is effectively exclusive, while readers still pass through.
//!   The lock is upgraded to a write lock only where the element list changes or
//!   the node subdivides or merges.
//! - A merge write-locks its node, then every descendant in depth-first order.
//!
//! Locks are always acquired parent before child, so no wait cycle can form.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use parking_lot::lock_api::{ArcRwLockUpgradableReadGuard, ArcRwLockWriteGuard};
use parking_lot::{RawRwLock, RwLock};

use crate::node::QuadNode;

/// Shared handle to a node.
pub(crate) type NodeRef<E> = Arc<RwLock<QuadNode<E>>>;

/// Upgradable guard that owns its node handle.
pub(crate) type UpgradableGuard<E> = ArcRwLockUpgradableReadGuard<RawRwLock, QuadNode<E>>;

/// Write guard that owns its node handle.
pub(crate) type WriteGuard<E> = ArcRwLockWriteGuard<RawRwLock, QuadNode<E>>;

/// Wrap a node for sharing.
pub(crate) fn share<E>(node: QuadNode<E>) -> NodeRef<E> {
    Arc::new(RwLock::new(node))
}

/// Upgrade a path guard for a structural or element-list change.
#[inline]
pub(crate) fn upgrade<E>(guard: UpgradableGuard<E>) -> WriteGuard<E> {
    ArcRwLockUpgradableReadGuard::upgrade(guard)
}

/// Write-lock every descendant of `node`, parents before children.
///
/// The caller must hold `node` exclusively so no new path can enter the subtree.
/// Operations already inside the subtree are waited out node by node.
pub(crate) fn lock_subtree<E>(node: &QuadNode<E>, out: &mut Vec<WriteGuard<E>>) {
    let Some(children) = node.children.as_ref() else {
        return;
    };
    for child in children {
        let guard = child.write_arc();
        lock_subtree(&guard, out);
        out.push(guard);
    }
}

/// Give back the count a remove took from each node on its path.
///
/// Called with no locks held, after the element turned out to be absent. Nodes
/// that were merged away in the meantime are detached, so adjusting them is
/// harmless.
pub(crate) fn restore_counts<E>(path: &[NodeRef<E>]) {
    for node in path {
        let guard = node.upgradable_read_arc();
        guard.total.fetch_add(1, Ordering::Relaxed);
    }
}
