use ct_patch::consts::SEED_ENV;
use ct_patch::prelude::*;
use ndarray::{s, Array3, Array4};

fn init_logger() {
    // 多个测试共享同一个全局 logger, 重复初始化会失败, 忽略即可.
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init();
}

/// 两通道 `(32, 28, 24)` 体数据, 含一个肝脏块与其中的一个肿瘤块.
fn liver_case() -> SampleData {
    let (h, w, d) = (32, 28, 24);
    let volume = Array4::from_shape_fn((h, w, d, 2), |(i, j, k, c)| {
        let hu = (i * w * d + j * d + k) as f32;
        if c == 0 {
            hu
        } else {
            -hu
        }
    });
    let mut mask = Array3::<u8>::zeros((h, w, d));
    mask.slice_mut(s![10..22, 8..20, 6..18]).fill(LITS_LIVER);
    mask.slice_mut(s![14..17, 12..15, 10..13]).fill(LITS_TUMOR);
    SampleData::new(Volume::new(volume).unwrap(), Mask::new(mask)).unwrap()
}

#[test]
fn training_config_end_to_end() {
    init_logger();
    let data = liver_case();
    let config = PatchConfig::new(
        SamplingMode::Training {
            num_pos: 12,
            num_neg: 8,
        },
        ResolutionPlan::from_pairs([(1.0, (25, 25, 25)), (0.5, (13, 13, 13)), (0.25, (7, 7, 7))])
            .unwrap(),
    )
    .unwrap();

    let out = PatchPipeline::from_seed(2024).run(&data, &config).unwrap();
    let positive = out.positive().unwrap();
    let negative = out.negative().unwrap();
    assert_eq!(positive.len(), config.plan.len());
    assert_eq!(negative.len(), config.plan.len());

    // 原分辨率层级的中心点落在期望的标签上, 且 patch 就是以其为中心的子块.
    for p in &positive[0].patches {
        assert_ne!(data.mask()[p.center()], BACKGROUND);
        assert_eq!(p.mask()[(12, 12, 12)], data.mask()[p.center()]);
        let (h, w, d) = p.center();
        assert_eq!(p.image()[(12, 12, 12, 0)], data.volume()[(h, w, d, 0)]);
        assert_eq!(p.image()[(12, 12, 12, 1)], data.volume()[(h, w, d, 1)]);
    }
    for p in &negative[0].patches {
        assert_eq!(data.mask()[p.center()], BACKGROUND);
    }

    for (set, count) in [(positive, 12), (negative, 8)] {
        for (level, expect) in set.iter().zip(config.plan.iter()) {
            assert_eq!(level.scale, expect.scale());
            assert_eq!(level.patches.len(), count);
            let (ph, pw, pd) = expect.patch_size().dim();
            for p in &level.patches {
                assert_eq!(p.image().dim(), (ph, pw, pd, 2));
                assert_eq!(p.mask().dim(), (ph, pw, pd));
                assert!(p.mask().iter().all(|x| *x <= LITS_TUMOR));
            }
        }
    }
}

#[test]
fn inference_covers_grid() {
    init_logger();
    let data = liver_case();
    let spacing = (8, 7, 6);
    let size = PatchSize::new((9, 7, 5)).unwrap();
    let out = PatchPipeline::from_seed(0)
        .single_resolution(&data, size, &SamplingMode::Inference { spacing })
        .unwrap();
    let all = out.inference().unwrap();
    assert_eq!(all.len(), 4 * 4 * 4);

    let expected = grid(data.shape(), spacing).unwrap();
    assert!(Iterator::eq(all.iter().map(Patch::center), expected.iter()));

    // 推理不依赖随机源.
    let again = PatchPipeline::from_seed(99)
        .single_resolution(&data, size, &SamplingMode::Inference { spacing })
        .unwrap();
    assert_eq!(out, again);
}

#[test]
fn multi_resolution_inference_maps_grid() {
    init_logger();
    let data = liver_case();
    let plan = ResolutionPlan::from_pairs([(1.0, (5, 5, 5)), (0.33, (3, 3, 3))]).unwrap();
    let out = PatchPipeline::from_seed(0)
        .multi_resolution(&data, &plan, &SamplingMode::Inference { spacing: (10, 10, 10) })
        .unwrap();
    let levels = out.inference().unwrap();
    assert_eq!(levels.len(), 2);
    assert_eq!(levels[0].patches.len(), levels[1].patches.len());
    for (full, low) in levels[0].patches.iter().zip(&levels[1].patches) {
        let (h, w, d) = full.center();
        let map = |c: usize| (c as f64 * 0.33).floor() as usize;
        assert_eq!(low.center(), (map(h), map(w), map(d)));
    }
}

#[test]
fn custom_resampler_and_rng() {
    use rand::rngs::mock::StepRng;

    /// 只接受缩放因子 1 的重采样器.
    struct Identity;

    impl VolumeResampler for Identity {
        fn zoom(
            &self,
            volume: &Volume,
            mask: Option<&Mask>,
            factors: [f64; 3],
        ) -> PatchResult<(Volume, Option<Mask>)> {
            if factors != [1.0; 3] {
                return Err(PatchError::InvalidScaleFactor(factors[0]));
            }
            Ok((volume.clone(), mask.cloned()))
        }
    }

    init_logger();
    let data = liver_case();
    let sampler = CenterPointSampler::new(StepRng::new(0, 1));
    let mut pipeline = PatchPipeline::new(sampler, Identity);
    let mode = SamplingMode::Training {
        num_pos: 3,
        num_neg: 3,
    };

    let plan = ResolutionPlan::single(PatchSize::cube(3).unwrap());
    let out = pipeline.multi_resolution(&data, &plan, &mode).unwrap();
    assert_eq!(out.positive().unwrap()[0].patches.len(), 3);

    let plan = ResolutionPlan::from_pairs([(1.0, (3, 3, 3)), (0.5, (3, 3, 3))]).unwrap();
    assert_eq!(
        pipeline.multi_resolution(&data, &plan, &mode).unwrap_err(),
        PatchError::InvalidScaleFactor(0.5)
    );
}

#[test]
fn seed_from_env() {
    init_logger();
    let data = liver_case();
    let mode = SamplingMode::default();
    let size = PatchSize::cube(5).unwrap();

    std::env::set_var(SEED_ENV, "31415");
    let a = PatchPipeline::from_env_or_entropy()
        .single_resolution(&data, size, &mode)
        .unwrap();
    let b = PatchPipeline::from_seed(31415)
        .single_resolution(&data, size, &mode)
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn resample_then_sample() {
    init_logger();
    let data = liver_case();
    let (volume, mask) = resample_by_spacing(
        &ZoomResampler,
        data.volume(),
        Some(data.mask()),
        [0.5, 0.5, 2.0],
        [1.0, 1.0, 1.0],
    )
    .unwrap();
    let mask = mask.unwrap();
    assert_eq!(volume.shape(), (16, 14, 48));
    assert_eq!(mask.shape(), volume.shape());

    let resampled = SampleData::new(volume, mask).unwrap();
    let out = PatchPipeline::from_seed(5)
        .single_resolution(
            &resampled,
            PatchSize::cube(7).unwrap(),
            &SamplingMode::Training {
                num_pos: 4,
                num_neg: 4,
            },
        )
        .unwrap();
    for p in out.positive().unwrap() {
        assert_ne!(resampled.mask()[p.center()], BACKGROUND);
    }
}
