// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reflector caches backing the indexed provider lookup

use crate::kubernetes::is_kind_served;
use crate::provider::checker::SyncFlag;
use crate::provider::lookup::IndexedLookup;
use crate::types::StoreKind;
use futures::StreamExt;
use kube::{
    api::DynamicObject,
    runtime::{reflector, reflector::store::Writer, watcher, WatchStreamExt},
    Api, Client,
};
use tracing::{info, warn};

/// Start a reflector for every served store kind.
///
/// The returned flag flips once every started cache has completed its
/// initial list. Kinds that are not installed, or whose discovery fails, get
/// no cache and are left to the list lookup.
pub async fn start_store_informers(client: &Client) -> (IndexedLookup, SyncFlag) {
    let mut lookup = IndexedLookup::new();
    let mut readers = Vec::new();

    for kind in StoreKind::ALL {
        match is_kind_served(client, &kind.gvk()).await {
            Ok(true) => {}
            Ok(false) => {
                info!("{} is not served, skipping its cache", kind.kind());
                continue;
            }
            Err(e) => {
                warn!("Failed to discover {}, skipping its cache: {}", kind.kind(), e);
                continue;
            }
        }

        let ar = kind.api_resource();
        let api: Api<DynamicObject> = Api::all_with(client.clone(), &ar);
        let writer = Writer::new(ar);
        let reader = writer.as_reader();

        let stream = reflector(writer, watcher(api, watcher::Config::default()))
            .default_backoff()
            .touched_objects();

        let kind_name = kind.kind();
        tokio::spawn(async move {
            stream
                .for_each(move |res| async move {
                    if let Err(e) = res {
                        warn!("{} watch error: {}", kind_name, e);
                    }
                })
                .await;
        });

        info!("Started cache for {}", kind.kind());
        lookup = lookup.with_store(kind, reader.clone());
        readers.push(reader);
    }

    let synced = SyncFlag::new();
    let flag = synced.clone();
    tokio::spawn(async move {
        for reader in readers {
            if let Err(e) = reader.wait_until_ready().await {
                warn!("Store cache will never become ready: {}", e);
                return;
            }
        }
        info!("Store caches synced");
        flag.mark_synced();
    });

    (lookup, synced)
}
