mod cucumber;

use ::cucumber::{codegen::LocalBoxFuture, event::ScenarioFinished, gherkin, writer, World};
use futures_util::FutureExt;
use log::*;
use tokio::runtime::Runtime;

use crate::cucumber::LaundryWorld;

fn main() {
    dotenvy::from_filename(".env.test").ok();
    env_logger::init();
    let runtime = Runtime::new().expect("Could not start the test runtime");
    runtime.block_on(
        LaundryWorld::cucumber()
            .with_writer(writer::Libtest::or_basic())
            .after(|_feature, _rule, scenario, finished, world| clean_up(scenario, finished, world))
            .run("tests/features"),
    );
    info!("🚀️ Laundry scenarios complete");
}

/// Passing scenarios leave nothing behind. A failed scenario keeps its database for inspection.
fn clean_up<'a>(
    scenario: &'a gherkin::Scenario,
    finished: &'a ScenarioFinished,
    world: Option<&'a mut LaundryWorld>,
) -> LocalBoxFuture<'a, ()> {
    async move {
        let Some(sys) = world.and_then(|w| w.system.as_mut()) else {
            debug!("🚀️ \"{}\" never built a laundry system. Nothing to clean up.", scenario.name);
            return;
        };
        match finished {
            ScenarioFinished::StepPassed => sys.dispose().await,
            ScenarioFinished::StepFailed(..) | ScenarioFinished::StepSkipped => {
                error!("🚀️ \"{}\" did not pass. Its database is kept at {}", scenario.name, sys.db_path);
            },
            other => trace!("🚀️ \"{}\" finished with {other:?}", scenario.name),
        }
    }
    .boxed_local()
}
