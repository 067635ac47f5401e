// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Drives a camera stack and an input-focus stack through a few simulated frames.

use anyhow::{bail, ensure, Result};
use precedence_arbiter::{AddTo, Arbiter, Disposable, DisposeBag, Priority};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Camera {
    Gameplay,
    Cutscene,
    PhotoMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    World,
    PauseMenu,
    Console,
}

mod ranks {
    use precedence_arbiter::Priority;

    pub const OVERLAY: Priority = Priority::new(0);
    pub const MENU: Priority = Priority::new(10);
    pub const SCRIPTED: Priority = Priority::new(20);
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let camera = Arbiter::new(Camera::Gameplay);
    let focus = Arbiter::new(Focus::World);

    camera.subscribe(|c| log::info!("Camera -> {c:?}"));
    focus.subscribe(|f| log::info!("Focus  -> {f:?}"));

    // Frame 1: a cutscene starts and owns the camera until it ends.
    let cutscene = camera.register(Camera::Cutscene, ranks::SCRIPTED);
    ensure!(camera.value() == Camera::Cutscene);

    // Frame 2: the player pauses. Everything the pause menu claims goes in one
    // bag so closing the menu releases all of it.
    let mut pause = DisposeBag::new();
    focus
        .register_scoped(Focus::PauseMenu, ranks::MENU)
        .add_to(&mut pause);
    pause.on_dispose(|| log::info!("Pause menu closed."));
    ensure!(focus.value() == Focus::PauseMenu);

    // Frame 3: photo mode from the pause menu outranks the cutscene camera.
    let photo = camera.register_scoped(Camera::PhotoMode, ranks::MENU);
    photo.add_to(&mut pause);
    ensure!(camera.value() == Camera::PhotoMode);

    // Frame 4: the debug console grabs focus on top of everything.
    let console = focus.register(Focus::Console, ranks::OVERLAY);
    ensure!(focus.value() == Focus::Console);
    focus.release(console);

    // Frame 5: the pause menu closes; the cutscene camera is back.
    pause.dispose();
    ensure!(camera.value() == Camera::Cutscene);
    ensure!(focus.value() == Focus::World);

    // Frame 6: the cutscene ends.
    camera.release(cutscene);
    ensure!(camera.value() == Camera::Gameplay);

    // Stale handles are refused instead of hijacking someone else's slot.
    match camera.set_priority(cutscene, Priority::HIGHEST) {
        Err(err) => log::info!("Stale handle rejected: {err}"),
        Ok(()) => bail!("a released handle was accepted"),
    }

    let stats = camera.pool().borrow().stats();
    log::info!(
        "Camera pool: {} allocated, {} live, {} free, {} retired.",
        stats.allocated,
        stats.live,
        stats.free,
        stats.retired
    );
    Ok(())
}
