//! Polling service scenarios over real machines.

#[cfg(test)]
mod tests {
    use crate::harness::{RemoteState, TwoMachines};
    use savesync_client::shutdown_channel;
    use savesync_core::SyncAction;
    use std::time::Duration;

    const TICK: Duration = Duration::from_millis(20);

    /// Wait until `check` holds on the remote, up to two seconds.
    async fn wait_for_remote(pair: &TwoMachines, check: impl Fn(&RemoteState) -> bool) -> bool {
        for _ in 0..100 {
            if check(&pair.remote.snapshot().await.unwrap()) {
                return true;
            }
            tokio::time::sleep(TICK).await;
        }
        false
    }

    /// A polling machine publishes a new save without anyone asking.
    #[tokio::test]
    async fn polling_machine_publishes_new_saves() {
        let pair = TwoMachines::on_disk().unwrap();
        pair.a.write_save("slot1.sav", b"v1").await.unwrap();
        pair.b.write_save("slot1.sav", b"v0").await.unwrap();

        let (handle, signal) = shutdown_channel();
        let poller = pair.a.poller(TICK);
        let task = tokio::spawn(async move { poller.run(signal).await });

        assert!(wait_for_remote(&pair, |r| r.save.as_deref() == Some(&b"v1"[..])).await);

        pair.a.write_save("slot1.sav", b"v2").await.unwrap();
        assert!(wait_for_remote(&pair, |r| r.save.as_deref() == Some(&b"v2"[..])).await);

        handle.shutdown();
        let stats = task.await.unwrap();
        assert!(stats.uploads >= 2, "{stats}");
        assert_eq!(stats.errors + stats.failed, 0, "{stats}");

        assert_eq!(pair.b.sync().await.action, SyncAction::Download);
        assert_eq!(pair.b.read_save("slot1.sav").await.unwrap(), b"v2");
    }

    /// The poller holds off while the game runs and syncs once it exits.
    #[tokio::test]
    async fn polling_waits_for_game_exit() {
        let pair = TwoMachines::in_memory().unwrap();
        pair.a.write_save("slot1.sav", b"session").await.unwrap();
        pair.a.set_game_running(true);

        let (handle, signal) = shutdown_channel();
        let poller = pair.a.poller(TICK);
        let task = tokio::spawn(async move { poller.run(signal).await });

        tokio::time::sleep(TICK * 5).await;
        assert_eq!(pair.remote.snapshot().await.unwrap(), RemoteState::default());

        pair.a.set_game_running(false);
        assert!(wait_for_remote(&pair, |r| r.save.is_some()).await);

        handle.shutdown();
        let stats = task.await.unwrap();
        assert!(stats.skipped >= 1, "{stats}");
        assert_eq!(stats.uploads, 1, "{stats}");
    }

    /// An outage shows up as error cycles; the poller rides it out.
    #[tokio::test]
    async fn polling_survives_outage() {
        let pair = TwoMachines::in_memory().unwrap();
        let store = pair.remote.memory_store().unwrap().clone();
        pair.a.write_save("slot1.sav", b"v1").await.unwrap();
        store.set_offline(Some("down for maintenance"));

        let (handle, signal) = shutdown_channel();
        let poller = pair.a.poller(TICK);
        let task = tokio::spawn(async move { poller.run(signal).await });

        tokio::time::sleep(TICK * 4).await;
        store.set_offline(None);
        assert!(wait_for_remote(&pair, |r| r.save.is_some()).await);

        handle.shutdown();
        let stats = task.await.unwrap();
        assert!(stats.errors >= 1, "{stats}");
        assert_eq!(stats.uploads, 1, "{stats}");
    }

    /// Two pollers on two machines settle on one save and go quiet.
    #[tokio::test]
    async fn two_pollers_converge() {
        let pair = TwoMachines::in_memory().unwrap();
        pair.a.write_save("slot1.sav", b"desktop").await.unwrap();
        pair.a.sync().await;
        pair.b.write_save("slot1.sav", b"laptop").await.unwrap();

        let (handle, signal) = shutdown_channel();
        let pa = pair.a.poller(TICK);
        let pb = pair.b.poller(TICK);
        let sa = signal.clone();
        let ta = tokio::spawn(async move { pa.run(sa).await });
        let tb = tokio::spawn(async move { pb.run(signal).await });

        tokio::time::sleep(TICK * 10).await;
        handle.shutdown();
        let (a, b) = (ta.await.unwrap(), tb.await.unwrap());

        assert_eq!(pair.a.read_save("slot1.sav").await.unwrap(), b"desktop");
        assert_eq!(pair.b.read_save("slot1.sav").await.unwrap(), b"desktop");
        assert_eq!(a.uploads, 0, "{a}");
        assert_eq!(b.downloads, 1, "{b}");
        assert_eq!(pair.b.backups().await.unwrap().len(), 1);
    }
}
