//! End-to-end tests for the split and describe steps

#[cfg(test)]
mod tests {
    use crate::{Advance, BatchScheduler, PipelineConfig, PipelineError, Splitter};
    use proptest::prelude::*;
    use std::sync::Arc;
    use storyboard_domain::{Batch, SchedulerState, Segment};
    use storyboard_llm::{
        ChatRequest, LlmError, MockProvider, OpenAiCompatibleProvider, Provider, ProviderConfig,
    };

    const SENTENCE_ENDS: &[char] = &['。', '！', '？'];

    fn fast_config() -> PipelineConfig {
        PipelineConfig {
            batch_delay_ms: 0,
            ..PipelineConfig::default()
        }
    }

    fn numbered(n: usize) -> Vec<Segment> {
        (1..=n)
            .map(|i| Segment::new(i, format!("{}. 镜头{}", i, i)))
            .collect()
    }

    /// Stub model: one numbered line per sentence of the user content
    fn echo_sentences(request: &ChatRequest) -> Result<String, LlmError> {
        let mut lines = Vec::new();
        let mut current = String::new();
        for c in request.user.chars().filter(|c| *c != '\n') {
            current.push(c);
            if SENTENCE_ENDS.contains(&c) {
                lines.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        Ok(lines
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{}. {}", i + 1, line))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    #[tokio::test]
    async fn test_merging_model_yields_single_segment() {
        let provider = Arc::new(MockProvider::new("1. 他走进屋子。他坐下。他叹了口气。"));
        let splitter = Splitter::new(provider.clone(), fast_config());

        let segments = splitter.split("他走进屋子。他坐下。他叹了口气。").await.unwrap();

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].index, 1);
        assert_eq!(segments[0].content(), "他走进屋子。他坐下。他叹了口气。");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_forty_five_segments_in_batches_of_twenty() {
        let provider = Arc::new(MockProvider::from_fn(|r| Ok(format!("描述:{}", r.user.lines().count()))));
        let scheduler = BatchScheduler::describe(provider.clone(), "", "", &fast_config());
        let mut state = SchedulerState::new(numbered(45), 20).unwrap();

        let mut batches = Vec::new();
        for _ in 0..3 {
            match scheduler.advance(&mut state).await.unwrap() {
                Advance::Progressed { batch, .. } => batches.push(batch),
                Advance::Complete => panic!("completed too early"),
            }
        }

        assert_eq!(
            batches,
            vec![Batch::new(0, 20), Batch::new(20, 40), Batch::new(40, 45)]
        );
        assert_eq!(state.current_index(), 45);
        assert_eq!(state.accumulated_output(), "描述:20\n\n描述:20\n\n描述:5");

        let before = state.clone();
        assert_eq!(scheduler.advance(&mut state).await.unwrap(), Advance::Complete);
        assert_eq!(state, before);
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_transport_and_protocol_errors_leave_state_untouched() {
        let provider = Arc::new(MockProvider::new("块"));
        let scheduler = BatchScheduler::describe(provider.clone(), "", "", &fast_config());
        let mut state = SchedulerState::new(numbered(30), 20).unwrap();
        scheduler.advance(&mut state).await.unwrap();
        let before = state.clone();

        provider.push_error(LlmError::Transport("operation timed out".to_string()));
        let err = scheduler.advance(&mut state).await.unwrap_err();
        assert_eq!(err.kind(), "transport");
        assert_eq!(state, before);

        provider.push_error(LlmError::Protocol {
            status: 429,
            body: r#"{"error":"quota exceeded"}"#.to_string(),
        });
        let err = scheduler.advance(&mut state).await.unwrap_err();
        assert_eq!(err.raw_body(), Some(r#"{"error":"quota exceeded"}"#));
        assert_eq!(state.current_index(), before.current_index());
        assert_eq!(state.accumulated_output(), before.accumulated_output());
    }

    #[tokio::test]
    async fn test_split_is_lossless_with_echo_model() {
        let source = "夜色很深。她推开门！“谁在那里？”\n\n没有人回答。风吹过走廊。\n\n她慢慢后退。";
        let config = PipelineConfig {
            max_line_chars: 10,
            max_chunk_chars: 20,
            ..fast_config()
        };
        let provider = Arc::new(MockProvider::from_fn(echo_sentences));
        let splitter = Splitter::new(provider.clone(), config);

        let segments = splitter.split(source).await.unwrap();

        let rebuilt: String = segments.iter().map(|s| s.content()).collect();
        assert_eq!(rebuilt, source.replace('\n', ""));
        assert!(provider.call_count() > 1);
        for (i, segment) in segments.iter().enumerate() {
            assert_eq!(segment.index, i + 1);
        }
    }

    #[tokio::test]
    async fn test_split_then_describe() {
        let provider = Arc::new(MockProvider::from_fn(|r| {
            if r.system.contains("分镜师") {
                echo_sentences(r)
            } else {
                Ok(r.user
                    .lines()
                    .map(|line| format!("{}\n画面描述：静\n视频描述：动\n------", line))
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
        }));
        let config = fast_config();

        let segments = Splitter::new(provider.clone(), config.clone())
            .split("他走进屋子。他坐下。他叹了口气。")
            .await
            .unwrap();
        let mut state = SchedulerState::new(segments, 2).unwrap();
        let scheduler = BatchScheduler::describe(provider.clone(), "他：灰色风衣", "--ar 9:16", &config);

        assert_eq!(scheduler.run_to_completion(&mut state).await.unwrap(), 2);
        let output = state.accumulated_output();
        assert!(output.starts_with("1. 他走进屋子。\n画面描述：静"));
        assert!(output.contains("------\n\n3. 他叹了口气。"));
        assert_eq!(output.matches("------").count(), 3);
    }

    #[tokio::test]
    async fn test_reset_then_reload() {
        let provider = Arc::new(MockProvider::new("块"));
        let scheduler = BatchScheduler::describe(provider.clone(), "", "", &fast_config());
        let mut state = SchedulerState::new(numbered(3), 2).unwrap();
        scheduler.advance(&mut state).await.unwrap();

        state.reset();
        assert_eq!(state.current_index(), 0);
        assert!(state.accumulated_output().is_empty());
        assert!(matches!(
            scheduler.advance(&mut state).await,
            Err(PipelineError::Config(_))
        ));

        state.load(numbered(2));
        assert!(matches!(
            scheduler.advance(&mut state).await.unwrap(),
            Advance::Progressed { remaining: 0, .. }
        ));
    }

    #[tokio::test]
    async fn test_custom_relay_without_url_fails_before_network() {
        let provider = OpenAiCompatibleProvider::new(ProviderConfig::new(
            Provider::Custom {
                base_url: String::new(),
            },
            "sk-test",
        ))
        .unwrap();
        let provider = Arc::new(provider);

        let err = Splitter::new(provider.clone(), fast_config())
            .split("他坐下。")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "config");

        let mut state = SchedulerState::new(numbered(1), 1).unwrap();
        let err = BatchScheduler::describe(provider, "", "", &fast_config())
            .advance(&mut state)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert_eq!(state.current_index(), 0);
    }

    proptest! {
        #[test]
        fn batches_visit_every_segment_once(total in 1usize..120, size in 1usize..30) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let provider = Arc::new(MockProvider::from_fn(|r| Ok(r.user.clone())));
            let scheduler = BatchScheduler::describe(provider.clone(), "", "", &fast_config());
            let mut state = SchedulerState::new(numbered(total), size).unwrap();

            let processed = runtime
                .block_on(scheduler.run_to_completion(&mut state))
                .unwrap();

            prop_assert_eq!(processed, total.div_ceil(size));
            prop_assert_eq!(state.current_index(), total);

            let sent: Vec<String> = provider
                .requests()
                .iter()
                .flat_map(|r| r.user.lines().map(str::to_string).collect::<Vec<_>>())
                .collect();
            let expected: Vec<String> = numbered(total).into_iter().map(|s| s.text).collect();
            prop_assert_eq!(sent, expected);
        }
    }
}
