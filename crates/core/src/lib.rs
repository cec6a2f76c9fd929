pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod region;
    pub mod video_metadata;
}

pub mod normalization;

pub mod detection {
    pub mod domain {
        pub mod detection_params;
        pub mod face_detector;
        pub mod face_extractor;
        pub mod region_grouper;
    }
    pub mod infrastructure;
}

pub mod recognition {
    pub mod domain {
        pub mod algorithm_kind;
        pub mod face_recognizer;
        pub mod label_dictionary;
        pub mod recognition_error;
        pub mod sample;
    }
    pub mod infrastructure;
    pub mod recognizer_model;
}

pub mod evaluation;

pub mod dataset;

pub mod annotation {
    pub mod domain {
        pub mod frame_annotator;
    }
    pub mod infrastructure;
}

pub mod video {
    pub mod domain {
        pub mod image_reader;
        pub mod image_writer;
        pub mod video_reader;
        pub mod video_writer;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod annotate_video_use_case;
    pub mod build_dataset_use_case;
    pub mod evaluate_model_use_case;
    pub mod pipeline_logger;
    pub mod train_model_use_case;
}
